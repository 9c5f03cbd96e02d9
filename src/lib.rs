//! `bufpool` - a disk-backed page buffer pool for an embedded storage
//! engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         BufferPool                           │
//! │  ┌───────────┐  ┌──────────────┐  ┌─────────────────────┐   │
//! │  │ partition │  │ frame table  │  │ allocation bitmap    │   │
//! │  │   set     │  │ (Vec<Frame>) │  │ (Mutex<Bitmap>)      │   │
//! │  └───────────┘  └──────────────┘  └─────────────────────┘   │
//! │        ↑ getEmptySlot (Clock-Sweep, replacer::clock)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              ↓
//!                    storage::DiskManager (single file)
//! ```
//! A fixed number of frames cache fixed-size pages read from and written
//! to a single backing file. Clients `pin`/`unpin` pages to get a stable
//! view of their bytes; `alloc`/`release` create and destroy pages;
//! `checkpoint` flushes dirty frames and persists the allocation bitmap.
//! Pages are sharded into partitions (`pageId mod numPartitions`) so
//! operations on disjoint pages proceed without contending for a single
//! lock, and eviction is a partitioned Clock-Sweep over the frame table.
//!
//! Transactions, write-ahead logging, crash recovery beyond "what was
//! checkpointed is durable", indexes, and queries are out of scope: this
//! crate is the cache and allocation layer underneath them.
//!
//! # Modules
//! - [`buffer`] - the pool façade, frames, partitions, and Clock-Sweep
//! - [`bitmap`] - the dense, growable allocation bitmap
//! - [`storage`] - the backing-file adapter and page byte buffers
//! - [`prefetch`] - the sequential-prefetch launcher
//! - [`executor`] - the task executor contract consumed by prefetch
//! - [`common`] - configuration, identifiers, and the error taxonomy
//!
//! # Quick start
//! ```no_run
//! use std::sync::Arc;
//! use bufpool::buffer::BufferPool;
//! use bufpool::common::config::{BufferPoolConfig, StorageConfig};
//! use bufpool::executor::NoExecutor;
//!
//! let pool = BufferPool::create(
//!     BufferPoolConfig::default(),
//!     "my_database.db",
//!     StorageConfig::default(),
//!     false,
//!     Arc::new(NoExecutor),
//! ).unwrap();
//!
//! let page = pool.alloc().unwrap();
//! let pid = page.page_id();
//! drop(page);
//!
//! let page = pool.pin(pid, false).unwrap();
//! page.write()[0] = 0xFF;
//! pool.set_dirty(pid).unwrap();
//! drop(page);
//!
//! pool.checkpoint().unwrap();
//! pool.close().unwrap();
//! ```

pub mod bitmap;
pub mod buffer;
pub mod common;
pub mod executor;
pub mod prefetch;
pub mod storage;

pub use buffer::BufferPool;
pub use common::config::{BufferPoolConfig, StorageConfig};
pub use common::{Error, FrameId, PageId, Result};
