use std::fmt;

use serde::{Deserialize, Serialize};

/// The visual themes a portfolio can be exported with.
/// Serialized with the browser's PascalCase names ("BentoGrid", "ClassicSerif", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    Minimalist,
    Developer,
    Creative,
    BentoGrid,
    Glassmorphism,
    Cyberpunk,
    ClassicSerif,
    ResumeFirst,
    Brutalist,
    Nature,
}

impl Theme {
    pub const ALL: [Theme; 10] = [
        Theme::Minimalist,
        Theme::Developer,
        Theme::Creative,
        Theme::BentoGrid,
        Theme::Glassmorphism,
        Theme::Cyberpunk,
        Theme::ClassicSerif,
        Theme::ResumeFirst,
        Theme::Brutalist,
        Theme::Nature,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Minimalist => "Minimalist",
            Theme::Developer => "Developer",
            Theme::Creative => "Creative",
            Theme::BentoGrid => "BentoGrid",
            Theme::Glassmorphism => "Glassmorphism",
            Theme::Cyberpunk => "Cyberpunk",
            Theme::ClassicSerif => "ClassicSerif",
            Theme::ResumeFirst => "ResumeFirst",
            Theme::Brutalist => "Brutalist",
            Theme::Nature => "Nature",
        }
    }

    /// Tailwind classes for the page shell of the exported snapshot.
    pub fn shell_classes(self) -> &'static str {
        match self {
            Theme::Minimalist => "min-h-screen bg-white text-slate-900 font-sans",
            Theme::Developer => "min-h-screen bg-slate-950 text-slate-100 font-mono",
            Theme::Creative => "min-h-screen bg-gradient-to-br from-rose-50 to-indigo-50 text-slate-900 font-sans",
            Theme::BentoGrid => "min-h-screen bg-neutral-100 text-neutral-900 font-sans",
            Theme::Glassmorphism => "min-h-screen bg-gradient-to-br from-sky-400 to-fuchsia-500 text-white font-sans",
            Theme::Cyberpunk => "min-h-screen bg-black text-yellow-300 font-mono",
            Theme::ClassicSerif => "min-h-screen bg-stone-50 text-stone-900 font-serif",
            Theme::ResumeFirst => "min-h-screen bg-gray-100 text-gray-900 font-sans",
            Theme::Brutalist => "min-h-screen bg-yellow-200 text-black font-mono",
            Theme::Nature => "min-h-screen bg-emerald-50 text-emerald-950 font-serif",
        }
    }

    /// Tailwind classes for each section card.
    pub fn card_classes(self) -> &'static str {
        match self {
            Theme::Minimalist | Theme::ClassicSerif => "py-8 border-b border-current/10",
            Theme::Developer => "p-6 rounded-lg border border-slate-800 bg-slate-900",
            Theme::Creative => "p-8 rounded-3xl bg-white/80 shadow-xl",
            Theme::BentoGrid => "p-6 rounded-2xl bg-white shadow-sm",
            Theme::Glassmorphism => "p-6 rounded-2xl bg-white/10 backdrop-blur-md border border-white/20",
            Theme::Cyberpunk => "p-6 border-2 border-yellow-300",
            Theme::ResumeFirst => "p-6 bg-white",
            Theme::Brutalist => "p-6 border-4 border-black bg-white shadow-[8px_8px_0_0_#000]",
            Theme::Nature => "p-6 rounded-xl bg-white/70",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "#000000".to_string(),
            secondary: "#ffffff".to_string(),
        }
    }
}
