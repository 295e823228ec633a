mod detection;
mod finding;
mod report;

pub use detection::{Detection, UnknownReason};
pub use finding::{
    Antivirus, AntivirusFinding, Encryption, EncryptionFinding, ScreenLock, ScreenLockFinding,
};
pub use report::{Family, PlatformInfo, SecurityReport, Snapshot};
