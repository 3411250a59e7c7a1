mod lifecycle;
mod new_session;
mod statements;
pub(crate) mod utils;
