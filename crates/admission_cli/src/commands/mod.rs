pub mod contacts;
pub mod rebuild;
pub mod resume;
pub mod show;
pub mod sign;
pub mod validate;

use clap::ValueEnum;

use admission_core::models::FormKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Application,
    Enrollment,
}

impl From<KindArg> for FormKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Application => FormKind::Application,
            KindArg::Enrollment => FormKind::Enrollment,
        }
    }
}
