//! Plain recursive walk: every directory is descended into

use std::fs::FileType;
use std::path::Path;

use super::TreeOps;
use crate::error::Result;
use crate::ui::Reporter;

/// Walk that has no atomic units
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTree;

impl TreeOps for PlainTree {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn is_atomic_unit(&self, _path: &Path, _file_type: &FileType) -> bool {
        false
    }

    fn copy_unit(&self, src: &Path, dst: &Path, reporter: &dyn Reporter) -> Result<()> {
        self.copy_tree(src, dst, reporter)
    }
}
