//! Attestations are what an attestation entity sends back after checking an
//! assertion. Each entry carries one of a closed set of detail shapes.

use crate::{
    address::Address,
    canonical::{pair, unpair, Canonical, Value},
    error::{Error, Result},
    util::ser::BinaryVec,
};
use getset;
use serde_derive::{Deserialize, Serialize};

/// A direct analysis of one metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct MessageAnalysis {
    /// Hash of the message body that was analyzed
    body_hash: BinaryVec,
    /// Hash of the attached object that was analyzed
    object_hash: BinaryVec,
    /// Which kind of metadata this is
    meta_type: i64,
    /// The value that was checked
    metavalue: String,
    /// The value's salt, as it appeared in the assertion
    meta_salt: BinaryVec,
    /// The verdict
    attest: String,
}

impl MessageAnalysis {
    /// Create a new analysis.
    pub fn new<S: Into<String>>(
        body_hash: BinaryVec,
        object_hash: BinaryVec,
        meta_type: i64,
        metavalue: S,
        meta_salt: BinaryVec,
        attest: S,
    ) -> Self {
        Self {
            body_hash,
            object_hash,
            meta_type,
            metavalue: metavalue.into(),
            meta_salt,
            attest: attest.into(),
        }
    }
}

canonical_record! {
    MessageAnalysis {
        body_hash: "bodyHash",
        object_hash: "objectHash",
        meta_type: "metaType",
        metavalue: "metavalue",
        meta_salt: "metaSalt",
        attest: "attest",
    }
}

/// One matched value inside a [MatchTarget].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Match {
    /// Which kind of metadata matched
    match_type: i64,
    /// The matched value
    match_value: String,
    /// Salt of the matched value
    match_salt: BinaryVec,
    /// The verdict
    attest: String,
}

impl Match {
    /// Create a new match.
    pub fn new<S: Into<String>>(match_type: i64, match_value: S, match_salt: BinaryVec, attest: S) -> Self {
        Self {
            match_type,
            match_value: match_value.into(),
            match_salt,
            attest: attest.into(),
        }
    }
}

canonical_record! {
    Match {
        match_type: "matchType",
        match_value: "matchValue",
        match_salt: "matchSalt",
        attest: "attest",
    }
}

/// A message/object compared against the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct MatchTarget {
    /// Hash of the target message body
    body_hash: BinaryVec,
    /// Hash of the target object
    object_hash: BinaryVec,
    /// What matched
    matches: Vec<Match>,
}

impl MatchTarget {
    /// Create a new match target.
    pub fn new(body_hash: BinaryVec, object_hash: BinaryVec, matches: Vec<Match>) -> Self {
        Self {
            body_hash,
            object_hash,
            matches,
        }
    }
}

canonical_record! {
    MatchTarget {
        body_hash: "bodyHash",
        object_hash: "objectHash",
        matches: "matches",
    }
}

/// A comparison of one message against others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct MessageComparison {
    /// Hash of the source message body
    source_body_hash: BinaryVec,
    /// Hash of the source object
    source_object_hash: BinaryVec,
    /// Everything the source was compared against
    targets: Vec<MatchTarget>,
}

impl MessageComparison {
    /// Create a new comparison.
    pub fn new(source_body_hash: BinaryVec, source_object_hash: BinaryVec, targets: Vec<MatchTarget>) -> Self {
        Self {
            source_body_hash,
            source_object_hash,
            targets,
        }
    }
}

canonical_record! {
    MessageComparison {
        source_body_hash: "sourceBodyHash",
        source_object_hash: "sourceObjectHash",
        targets: "targets",
    }
}

/// Risk intelligence pulled from an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct RiskIntel {
    /// Which kind of metadata was looked up
    meta_type: i64,
    /// The value looked up
    meta_value: String,
    /// The value's salt
    meta_salt: String,
    /// The verdict
    attest: String,
    /// Name of the external source
    external_source: String,
    /// The source's own ID
    source_id: String,
    /// ID of the document within the source
    external_doc_id: String,
    /// Key of the record within the source
    external_key: String,
    /// Risk level
    risk: String,
    /// What kind of risk
    risk_descriptor: String,
    /// Free-form details
    details: String,
}

impl RiskIntel {
    /// Create a new piece of risk intel.
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>>(
        meta_type: i64,
        meta_value: S,
        meta_salt: S,
        attest: S,
        external_source: S,
        source_id: S,
        external_doc_id: S,
        external_key: S,
        risk: S,
        risk_descriptor: S,
        details: S,
    ) -> Self {
        Self {
            meta_type,
            meta_value: meta_value.into(),
            meta_salt: meta_salt.into(),
            attest: attest.into(),
            external_source: external_source.into(),
            source_id: source_id.into(),
            external_doc_id: external_doc_id.into(),
            external_key: external_key.into(),
            risk: risk.into(),
            risk_descriptor: risk_descriptor.into(),
            details: details.into(),
        }
    }
}

canonical_record! {
    RiskIntel {
        meta_type: "metaType",
        meta_value: "metaValue",
        meta_salt: "metaSalt",
        attest: "attest",
        external_source: "externalSource",
        source_id: "sourceID",
        // misspelled on the wire, and other implementations expect it that way
        external_doc_id: "exteranalDocID",
        external_key: "externalKey",
        risk: "risk",
        risk_descriptor: "riskDescriptor",
        details: "details",
    }
}

/// Research on an entity against external sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct ResearchAnalysis {
    /// Who was researched
    entity_addr: Address,
    /// Hash of the message body the research is about
    body_hash: BinaryVec,
    /// Hash of the object the research is about
    object_hash: BinaryVec,
    /// What turned up
    targets: Vec<RiskIntel>,
}

impl ResearchAnalysis {
    /// Create a new research analysis.
    pub fn new(entity_addr: Address, body_hash: BinaryVec, object_hash: BinaryVec, targets: Vec<RiskIntel>) -> Self {
        Self {
            entity_addr,
            body_hash,
            object_hash,
            targets,
        }
    }
}

canonical_record! {
    ResearchAnalysis {
        entity_addr: "entityAddr",
        body_hash: "bodyHash",
        object_hash: "objectHash",
        targets: "targets",
    }
}

/// The attestation entity refuses to attest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Rejection {
    /// Hash of the message being rejected
    attestation_message_hash: BinaryVec,
    /// Why
    reject_reason: String,
}

impl Rejection {
    /// Create a new rejection.
    pub fn new<S: Into<String>>(attestation_message_hash: BinaryVec, reject_reason: S) -> Self {
        Self {
            attestation_message_hash,
            reject_reason: reject_reason.into(),
        }
    }
}

canonical_record! {
    Rejection {
        attestation_message_hash: "attestationMessageHash",
        reject_reason: "rejectReason",
    }
}

/// The closed set of attestation details. Goes over the wire as
/// `[variantName, record]` so decoding knows the shape before it looks at the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttestationDetail {
    MessageAnalysis(MessageAnalysis),
    MessageComparison(MessageComparison),
    ResearchAnalysis(ResearchAnalysis),
    Rejection(Rejection),
}

impl AttestationDetail {
    /// The variant name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageAnalysis(_) => "MessageAnalysis",
            Self::MessageComparison(_) => "MessageComparison",
            Self::ResearchAnalysis(_) => "ResearchAnalysis",
            Self::Rejection(_) => "Rejection",
        }
    }
}

impl Canonical for AttestationDetail {
    fn to_struct(&self) -> Value {
        let record = match self {
            Self::MessageAnalysis(x) => x.to_struct(),
            Self::MessageComparison(x) => x.to_struct(),
            Self::ResearchAnalysis(x) => x.to_struct(),
            Self::Rejection(x) => x.to_struct(),
        };
        pair(Value::from(self.name()), record)
    }

    fn from_struct(value: Value) -> Result<Self> {
        let (name, record) = unpair(value)?;
        let name = String::from_struct(name)?;
        let detail = match name.as_str() {
            "MessageAnalysis" => Self::MessageAnalysis(MessageAnalysis::from_struct(record)?),
            "MessageComparison" => Self::MessageComparison(MessageComparison::from_struct(record)?),
            "ResearchAnalysis" => Self::ResearchAnalysis(ResearchAnalysis::from_struct(record)?),
            "Rejection" => Self::Rejection(Rejection::from_struct(record)?),
            _ => Err(Error::EncodingUnknownVariant {
                enumeration: "AttestationDetail",
                variant: name,
            })?,
        };
        Ok(detail)
    }
}

/// One attested check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct AttestationEntry {
    /// Which check this is (`MRZ`, `PEP`, ...)
    attest_type: String,
    /// The result
    detail: AttestationDetail,
}

impl AttestationEntry {
    /// Create a new entry.
    pub fn new<S: Into<String>>(attest_type: S, detail: AttestationDetail) -> Self {
        Self {
            attest_type: attest_type.into(),
            detail,
        }
    }
}

canonical_record! {
    AttestationEntry {
        attest_type: "attestType",
        detail: "detail",
    }
}

/// A set of attested checks about one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Attestation {
    /// Who the checks are about
    subject: Address,
    /// The checks
    attestations: Vec<AttestationEntry>,
}

impl Attestation {
    /// Create a new attestation.
    pub fn new(subject: Address, attestations: Vec<AttestationEntry>) -> Self {
        Self { subject, attestations }
    }
}

canonical_record! {
    Attestation {
        subject: "subject",
        attestations: "attestations",
    }
}
