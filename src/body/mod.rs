//! Message bodies and the registry that ties each one to its body type tag.
//!
//! The set of body types is closed. Every tag maps to at most one payload
//! shape and every shape maps to exactly one tag, and that pairing is fixed at
//! compile time: [MessageBody] is a plain sum type and decoding always reads
//! the tag first, then decodes the payload as the shape the tag names. Tags
//! that exist but have no shape yet (`Checkpoint`, `Backup`, ...) fail with
//! [Error::UnknownBodyType].

use crate::{
    canonical::{Canonical, Value},
    error::{Error, Result},
};
use serde_derive::{Deserialize, Serialize};

mod assertion;
mod attestation;
mod registration;
mod service;

pub use assertion::*;
pub use attestation::*;
pub use registration::*;
pub use service::*;

/// The body type tag carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodyType {
    Checkpoint,
    InviteRegistration,
    RegistrationRequest,
    DelegatePersona,
    Backup,
    Recover,
    Assertion,
    Attestation,
    VerificationRequest,
    ServiceOffering,
    ServiceRegistration,
    AmendmentRequest,
    ServiceSubscription,
    ServiceTermination,
    Delegation,
    Validation,
}

canonical_enum! {
    @names BodyType {
        Checkpoint,
        InviteRegistration,
        RegistrationRequest,
        DelegatePersona,
        Backup,
        Recover,
        Assertion,
        Attestation,
        VerificationRequest,
        ServiceOffering,
        ServiceRegistration,
        AmendmentRequest,
        ServiceSubscription,
        ServiceTermination,
        Delegation,
        Validation,
    }
}

impl Canonical for BodyType {
    fn to_struct(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_struct(value: Value) -> Result<Self> {
        let name = String::from_struct(value)?;
        Self::from_name(&name).ok_or(Error::UnknownBodyType(name))
    }
}

/// Builds [MessageBody] from the list of registered shapes. Each variant is
/// named after its body type tag, which is what keeps tag and shape in sync.
macro_rules! message_bodies {
    ($($variant:ident),+ $(,)?) => {
        /// A message payload, one variant per registered body type.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum MessageBody {
            $(
                #[allow(missing_docs)]
                $variant($variant),
            )+
        }

        impl MessageBody {
            /// The tag this body travels under.
            pub fn body_type(&self) -> BodyType {
                match self {
                    $( Self::$variant(_) => BodyType::$variant, )+
                }
            }

            /// Project the payload (without its tag).
            pub fn to_struct(&self) -> Value {
                match self {
                    $( Self::$variant(body) => body.to_struct(), )+
                }
            }

            /// Decode a payload as the shape `body_type` names.
            pub fn from_struct(body_type: BodyType, value: Value) -> Result<Self> {
                match body_type {
                    $( BodyType::$variant => Ok(Self::$variant(<$variant>::from_struct(value)?)), )+
                    _ => Err(Error::UnknownBodyType(body_type.to_string())),
                }
            }
        }

        impl BodyType {
            /// Whether a payload shape is registered for this tag.
            pub fn has_shape(&self) -> bool {
                matches!(self, $( Self::$variant )|+)
            }
        }

        $(
            impl From<$variant> for MessageBody {
                fn from(body: $variant) -> Self {
                    Self::$variant(body)
                }
            }
        )+
    };
}

message_bodies! {
    InviteRegistration,
    RegistrationRequest,
    Assertion,
    Attestation,
    ServiceRegistration,
}

/// Look a tag up by name, failing unless a payload shape is registered for it.
pub fn resolve(tag: &str) -> Result<BodyType> {
    BodyType::from_name(tag)
        .filter(|ty| ty.has_shape())
        .ok_or_else(|| Error::UnknownBodyType(String::from(tag)))
}

/// The tag a body travels under. Can't fail: a body that isn't registered
/// can't be a [MessageBody] in the first place.
pub fn tag_for(body: &MessageBody) -> BodyType {
    body.body_type()
}
