//! 자격증명 진단을 위한 도메인 모델.

mod credential;
mod environment;
mod outcome;
mod recommendation;
mod report;

pub use credential::*;
pub use environment::*;
pub use outcome::*;
pub use recommendation::*;
pub use report::*;
