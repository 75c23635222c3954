//! Pure, stateless byte kernels shared by the fixed-width decoder and the
//! tagged message decoder. Nothing in here touches I/O.

pub mod ascii_int;
pub mod be_uint;
pub mod fixed_point;
