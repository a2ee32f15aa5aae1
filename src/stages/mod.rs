pub mod stage0_extract;
pub mod stage1_reconcile;
pub mod stage2_assemble;
pub mod stage3_render;

pub use stage0_extract::*;
pub use stage1_reconcile::*;
pub use stage2_assemble::*;
pub use stage3_render::*;
