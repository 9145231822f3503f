mod chrome_finder;
mod error;
mod session;
mod user_agent;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use session::{BrowserSession, LaunchOptions, PollOutcome};
pub use user_agent::random_user_agent;
