pub mod anthropic;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use traits::VisionCapability;
