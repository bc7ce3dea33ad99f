/// Active console view. Starts at `Menu`; only keyboard input changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ViewState {
    #[default]
    Menu = 0,
    Summary = 1,
    Detail = 2,
}

impl ViewState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ViewState::Summary,
            2 => ViewState::Detail,
            _ => ViewState::Menu,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewState::Menu => "Main Menu",
            ViewState::Summary => "Summary View",
            ViewState::Detail => "Detailed View",
        }
    }
}
