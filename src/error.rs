use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record ended before all fields were read")]
    Truncated,

    #[error("Unsupported gump schema version {0}")]
    UnsupportedVersion(u32),

    #[error("Markup error: {0}")]
    Markup(#[from] quick_xml::Error),

    #[error("Markup attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Missing attribute `{0}`")]
    MissingAttribute(&'static str),

    #[error("Invalid value for attribute `{name}`: {value:?}")]
    InvalidAttribute { name: &'static str, value: String },

    #[error("No gump element found in markup")]
    NoElement,
}

impl PersistError {
    /// Maps an I/O failure, turning a short read into [`PersistError::Truncated`].
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            PersistError::Truncated
        } else {
            PersistError::Io(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
