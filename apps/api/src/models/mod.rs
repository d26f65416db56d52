pub mod resume;
pub mod theme;

pub use resume::ResumeData;
pub use theme::{Theme, ThemeColors};
