mod chrome;
#[allow(clippy::module_inception)]
mod exam;
mod question;
mod scripts;
mod start_screen;
mod submitted;

pub use exam::ExamView;
#[cfg(test)]
pub(crate) use exam::ExamTestHandles;
