//! Together - a collaborative rich-text editing core built on a sequence
//! CRDT with tombstones and a Peritext-style inline formatting engine.
//!
//! # Quick Start
//!
//! ```
//! use together::change::PrimitiveOp;
//! use together::document::Document;
//!
//! let mut doc = Document::new("doc0");
//! doc.change(vec![PrimitiveOp::Insert {
//!     path: vec!["text".to_string()],
//!     index: 0,
//!     values: "Hello, World!".chars().map(|c| c.to_string()).collect(),
//!     after: None,
//! }]).unwrap();
//! assert_eq!(doc.text(), "Hello, World!");
//! ```

pub mod change;
pub mod clock;
pub mod crdt;
pub mod document;
pub mod error;
pub mod format;
pub mod id;
pub mod sync;
