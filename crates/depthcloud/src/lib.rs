#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use depthcloud_image as image;

#[doc(inline)]
pub use depthcloud_io as io;

#[doc(inline)]
pub use depthcloud_3d as d3;
