#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod upstream;

pub use upstream::ReqwestUpstream;
