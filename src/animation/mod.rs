//! Scalar animation curves sampled per frame.

pub mod anim;
pub mod ease;
pub mod proc;
