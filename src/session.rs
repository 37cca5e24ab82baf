//! Per-translation state: named output regions, accumulated includes, and
//! the stack of blocks currently being filled.
//!
//! One session exists per translation and is threaded explicitly through the
//! translator, the binding generator, and the renderer; the renderer consumes
//! it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cpp::{Block, Stmt};
use crate::error::Result;

/// Region that receives the translated module body
pub const REGION_MAIN: &str = "main";
/// Region rendered before the module body (binding includes live here)
pub const REGION_HEADER: &str = "header";
/// Region rendered after the module body (binding registrations live here)
pub const REGION_FOOTER: &str = "footer";

#[derive(Debug, Default)]
pub struct Session {
    /// Named output regions, rendered in header / main / footer order
    blocks: BTreeMap<String, Block>,
    /// Ordered, de-duplicated `#include` targets
    includes: Vec<String>,
    /// Blocks currently being filled, innermost last
    stack: Vec<Block>,
    /// Definitions that must be emitted after the block being built
    /// (static member initializers)
    deferred: Vec<Stmt>,
    /// Target extension-module name, set by the binding generator
    libname: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// The named region, created as an empty sequence on first use
    pub fn block_or_create(&mut self, name: &str) -> &mut Block {
        self.blocks
            .entry(name.to_string())
            .or_insert_with(Block::sequence)
    }

    /// The named region, if it has been created
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    /// Replaces the named region wholesale
    pub fn set_block(&mut self, name: &str, block: Block) {
        self.blocks.insert(name.to_string(), block);
    }

    /// Records a required `#include` target, keeping first-seen order
    pub fn add_include(&mut self, header: &str) {
        if !self.includes.iter().any(|h| h == header) {
            debug!(header, "include added");
            self.includes.push(header.to_string());
        }
    }

    /// The includes accumulated so far
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn set_libname(&mut self, name: &str) {
        self.libname = Some(name.to_string());
    }

    /// Target extension-module name, once bound
    pub fn libname(&self) -> Option<&str> {
        self.libname.as_deref()
    }

    /// Runs `fill` with `block` on top of the stack; the block is popped on
    /// every exit path, including the error one
    pub fn scoped<F>(&mut self, block: Block, fill: F) -> Result<Block>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        self.stack.push(block);
        let outcome = fill(self);
        // pop before propagating so an error can't leave the frame behind
        let block = match self.stack.pop() {
            Some(b) => b,
            None => Block::sequence(),
        };
        outcome.map(|_| block)
    }

    /// Pushes a block onto the in-flight stack; pair with [`Session::end_block`]
    pub fn begin_block(&mut self, block: Block) {
        self.stack.push(block);
    }

    /// Pops and returns the innermost in-flight block. Callers that began a
    /// block must end it on every exit path, including error arms.
    pub fn end_block(&mut self) -> Block {
        match self.stack.pop() {
            Some(block) => block,
            None => Block::sequence(),
        }
    }

    /// The innermost in-flight block, if any
    pub fn current(&mut self) -> Option<&mut Block> {
        self.stack.last_mut()
    }

    /// Appends a statement to the innermost in-flight block
    pub fn push_stmt(&mut self, stmt: Stmt) {
        if let Some(block) = self.stack.last_mut() {
            block.add(stmt);
        }
    }

    /// Queues a definition to be appended after the enclosing block
    pub fn defer(&mut self, stmt: Stmt) {
        self.deferred.push(stmt);
    }

    /// Takes the queued deferred definitions
    pub fn take_deferred(&mut self) -> Vec<Stmt> {
        std::mem::take(&mut self.deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::Expr;
    use crate::error::Error;

    #[test]
    fn test_includes_are_deduplicated_in_order() {
        let mut s = Session::new();
        s.add_include("cmath");
        s.add_include("array.h");
        s.add_include("cmath");
        assert_eq!(s.includes(), ["cmath", "array.h"]);
    }

    #[test]
    fn test_scoped_returns_filled_block() {
        let mut s = Session::new();
        let block = s
            .scoped(Block::sequence(), |s| {
                s.push_stmt(Stmt::Return(Some(Expr::int(1))));
                Ok(())
            })
            .unwrap();
        assert_eq!(block.statements.len(), 1);
        assert!(s.current().is_none());
    }

    #[test]
    fn test_scoped_pops_on_error() {
        let mut s = Session::new();
        let result = s.scoped(Block::sequence(), |_| {
            Err(Error::type_error("boom"))
        });
        assert!(result.is_err());
        // the failed frame must not linger on the stack
        assert!(s.current().is_none());
    }

    #[test]
    fn test_named_regions() {
        let mut s = Session::new();
        s.block_or_create(REGION_HEADER)
            .add(Stmt::comment("header"));
        assert!(s.block(REGION_HEADER).is_some());
        assert!(s.block(REGION_FOOTER).is_none());
    }
}
