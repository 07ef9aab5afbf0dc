/// Stable stand-in for the unstable `!` type, for `Result`s that can only
/// ever carry an error.
#[derive(Debug)]
pub enum Never {}
