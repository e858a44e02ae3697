pub mod blur;
pub mod enhance;
pub mod fit;
pub mod locate;
pub mod padding;
pub mod pipeline;
pub mod redact;
pub mod resize;
pub mod save;
pub mod split;
