use std::io::Read;

/// Decode a value out of a local artifact.
///
/// The registry streams the provisioned file through this trait so that it never needs to know
/// what the artifact holds.
pub trait ArtifactDecode: Sized {
    type Error: Into<Box<dyn std::error::Error + Send + Sync>>;

    fn decode<R: Read>(reader: R) -> Result<Self, Self::Error>;
}

/// Raw bytes of an artifact, handy when the caller only wants to inspect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_more::Deref, derive_more::From)]
pub struct RawArtifact(pub Vec<u8>);

impl ArtifactDecode for RawArtifact {
    type Error = std::io::Error;

    fn decode<R: Read>(mut reader: R) -> Result<Self, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self(bytes))
    }
}
