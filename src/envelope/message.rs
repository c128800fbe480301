use crate::{
    body::{BodyType, MessageBody},
    canonical::{Canonical, RecordBuilder, RecordReader, Value},
    error::{Error, Result},
    relationship::Salt,
};
use getset;
use serde_derive::{Deserialize, Serialize};

/// The plaintext inside an envelope: who it's for within the service, which
/// dossier it belongs to, and the typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct Message {
    /// The service this message is sent under
    service_id: u64,
    /// The receiving party's ID within the service (absent for public
    /// messages)
    consumer_id: Option<u64>,
    /// The salt of the dossier this message belongs to
    dossier_salt: Salt,
    /// The body's tag. Always agrees with `body`.
    body_type: BodyType,
    /// The payload
    body: MessageBody,
}

impl Message {
    /// Create a new message. The body type is taken from the body itself, so
    /// the two can't disagree.
    pub fn new(service_id: u64, consumer_id: Option<u64>, dossier_salt: Salt, body: MessageBody) -> Self {
        Self {
            service_id,
            consumer_id,
            dossier_salt,
            body_type: body.body_type(),
            body,
        }
    }

    /// Consume the message, returning its body.
    pub fn into_body(self) -> MessageBody {
        self.body
    }
}

impl Canonical for Message {
    fn to_struct(&self) -> Value {
        RecordBuilder::new()
            .field("serviceID", &self.service_id)
            .field("consumerID", &self.consumer_id)
            .field("dossierSalt", &self.dossier_salt)
            .field("bodyType", &self.body_type)
            .field_struct("body", self.body.to_struct())
            .build()
    }

    // tag first, then the body as the shape the tag names
    fn from_struct(value: Value) -> Result<Self> {
        let mut record = RecordReader::new("Message", value)?;
        let body_type: BodyType = record.take("bodyType")?;
        if !body_type.has_shape() {
            Err(Error::UnknownBodyType(body_type.to_string()))?;
        }
        let body = MessageBody::from_struct(body_type, record.take_struct("body")?)?;
        let message = Self {
            service_id: record.take("serviceID")?,
            consumer_id: record.take("consumerID")?,
            dossier_salt: record.take("dossierSalt")?,
            body_type,
            body,
        };
        record.finish()?;
        Ok(message)
    }
}
