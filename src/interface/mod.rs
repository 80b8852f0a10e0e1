mod directory;
mod notifier;

pub use directory::Directory;
pub use notifier::Notifier;

#[cfg(test)]
pub(crate) use directory::MockDirectory;
#[cfg(test)]
pub(crate) use notifier::MockNotifier;
