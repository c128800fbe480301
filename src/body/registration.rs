//! Onboarding. A service hands out an [Invitation] out of band, announces it
//! with an [InviteRegistration], and the invitee answers with a
//! [RegistrationRequest] carrying their public key.

use crate::{
    address::Address,
    canonical::{Canonical, RecordBuilder, RecordReader, Value},
    crypto::base::AsymmetricKey,
    error::Result,
    util::ser::BinaryVec,
};
use getset;
use serde_derive::{Deserialize, Serialize};

/// Announces an invitation to the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct InviteRegistration {
    /// The node to connect to (yes, "boostrap")
    boostrap_node: String,
    /// The address of that node
    boostrap_addr: Address,
    /// The address of the service making the offer
    offering_addr: Address,
    /// Hash of the service announcement this invitation refers to
    service_announcement_message: BinaryVec,
    /// Which of the service's offerings this is for
    service_offering_id: u64,
    /// Opaque invite name
    invite_name: BinaryVec,
}

impl InviteRegistration {
    /// Create a new invite registration.
    pub fn new<S: Into<String>>(
        boostrap_node: S,
        boostrap_addr: Address,
        offering_addr: Address,
        service_announcement_message: BinaryVec,
        service_offering_id: u64,
        invite_name: BinaryVec,
    ) -> Self {
        Self {
            boostrap_node: boostrap_node.into(),
            boostrap_addr,
            offering_addr,
            service_announcement_message,
            service_offering_id,
            invite_name,
        }
    }
}

canonical_record! {
    InviteRegistration {
        boostrap_node: "boostrapNode",
        boostrap_addr: "boostrapAddr",
        offering_addr: "offeringAddr",
        service_announcement_message: "serviceAnnouncementMessage",
        service_offering_id: "serviceOfferingID",
        invite_name: "inviteName",
    }
}

/// The out-of-band invitation itself: everything in the registration plus the
/// secret bits the invitee needs to answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Invitation {
    /// The public half of the invitation
    registration: InviteRegistration,
    /// ID of the message announcing the invite
    invite_msg_id: BinaryVec,
    /// Key the invitee proves possession of
    invite_key: BinaryVec,
}

impl Invitation {
    /// Create a new invitation.
    pub fn new(registration: InviteRegistration, invite_msg_id: BinaryVec, invite_key: BinaryVec) -> Self {
        Self {
            registration,
            invite_msg_id,
            invite_key,
        }
    }
}

// flattened on the wire: the registration's fields sit next to ours
impl Canonical for Invitation {
    fn to_struct(&self) -> Value {
        let reg = &self.registration;
        RecordBuilder::new()
            .field("boostrapNode", &reg.boostrap_node)
            .field("boostrapAddr", &reg.boostrap_addr)
            .field("offeringAddr", &reg.offering_addr)
            .field("serviceAnnouncementMessage", &reg.service_announcement_message)
            .field("serviceOfferingID", &reg.service_offering_id)
            .field("inviteName", &reg.invite_name)
            .field("inviteMsgID", &self.invite_msg_id)
            .field("inviteKey", &self.invite_key)
            .build()
    }

    fn from_struct(value: Value) -> Result<Self> {
        let mut record = RecordReader::new("Invitation", value)?;
        let registration = InviteRegistration {
            boostrap_node: record.take("boostrapNode")?,
            boostrap_addr: record.take("boostrapAddr")?,
            offering_addr: record.take("offeringAddr")?,
            service_announcement_message: record.take("serviceAnnouncementMessage")?,
            service_offering_id: record.take("serviceOfferingID")?,
            invite_name: record.take("inviteName")?,
        };
        let invitation = Self {
            registration,
            invite_msg_id: record.take("inviteMsgID")?,
            invite_key: record.take("inviteKey")?,
        };
        record.finish()?;
        Ok(invitation)
    }
}

/// An invitee answering an invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct RegistrationRequest {
    /// The invitation being answered
    invite_msg_id: BinaryVec,
    /// Proof the invitee holds the invite key
    key_proof: BinaryVec,
    /// The invite name (as text this time)
    invite_name: String,
    /// Hex DER of the invitee's public key
    public_key: String,
    /// What the invitee wants to be called
    public_nickname: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new<S: Into<String>>(invite_msg_id: BinaryVec, key_proof: BinaryVec, invite_name: S, public_key: S, public_nickname: S) -> Self {
        Self {
            invite_msg_id,
            key_proof,
            invite_name: invite_name.into(),
            public_key: public_key.into(),
            public_nickname: public_nickname.into(),
        }
    }

    /// Import the public key this request carries.
    pub fn import_public_key(&self) -> Result<AsymmetricKey> {
        AsymmetricKey::import_public_hex(&self.public_key)
    }
}

canonical_record! {
    RegistrationRequest {
        invite_msg_id: "inviteMsgID",
        key_proof: "keyProof",
        invite_name: "inviteName",
        public_key: "publicKey",
        public_nickname: "publicNickname",
    }
}
