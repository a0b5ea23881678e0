use tabnav_api::profile::Profile;

/// Terminates the shell, with the given exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainShutdown(pub i32);

impl Default for MainShutdown {
    fn default() -> Self {
        MainShutdown(0)
    }
}

/// A command from the cli, received by the `MainService`.
///
/// Commands are handled in order.  Each is complete before the next is processed.
#[derive(Debug, Clone)]
pub enum MainRecv {
    LoadProfile(Profile),
    OpenTabs(Vec<String>),
    ListTabs,
    Shutdown,
}
