/// Actions the live dashboard reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,

    // Scrolling the resource lists
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,

    /// Show only resources that are not fully ready
    ToggleUnreadyOnly,

    DismissError,
}
