//! Service offerings: what a service provider publishes so consumers know which
//! documents it wants and who should attest to them.

use crate::{address::Address, util::{ser::BinaryVec, Date}};
use getset;
use serde_derive::{Deserialize, Serialize};

/// Where an attestation entity should send its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DestinationType {
    /// Only the consumer gets the attestation.
    SendConsumer,
    /// Only the service provider gets the attestation.
    #[default]
    SendServiceProvider,
    /// Everyone gets a copy.
    SendBoth,
}

canonical_enum! {
    DestinationType {
        SendConsumer,
        SendServiceProvider,
        SendBoth,
    }
}

/// The data-only description of a form: which fields a consumer fills in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct XForm {
    /// Names of the fields, in display order
    fields_init: Vec<String>,
}

impl XForm {
    /// Describe a form by its field names.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(fields: I) -> Self {
        Self {
            fields_init: fields.into_iter().map(|f| f.into()).collect(),
        }
    }
}

canonical_record! {
    XForm {
        fields_init: "fields_init",
    }
}

/// An attestation a service requires on a document, and who performs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct ServiceAttestation {
    /// The attestation entity
    ae_pm_address: Address,
    /// Which checks the entity runs
    attestation_list: Vec<String>,
    /// Who gets the result
    destination_pm_address: DestinationType,
    /// How often the attestation gets refreshed, if ever
    update_frequency_in_days: Option<u32>,
}

impl ServiceAttestation {
    /// Create a new required attestation.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(
        ae_pm_address: Address,
        attestation_list: I,
        destination_pm_address: DestinationType,
        update_frequency_in_days: Option<u32>,
    ) -> Self {
        Self {
            ae_pm_address,
            attestation_list: attestation_list.into_iter().map(|a| a.into()).collect(),
            destination_pm_address,
            update_frequency_in_days,
        }
    }
}

canonical_record! {
    ServiceAttestation {
        ae_pm_address: "aePMAddress",
        attestation_list: "attestation_list",
        destination_pm_address: "destinationPMAddress",
        update_frequency_in_days: "updateFrequencyInDays",
    }
}

/// A document a service asks for, along with the attestations it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct ServiceDocument {
    /// The form describing the document
    xform: XForm,
    /// What has to be attested
    required_attestations: Vec<ServiceAttestation>,
}

impl ServiceDocument {
    /// Create a new service document.
    pub fn new(xform: XForm, required_attestations: Vec<ServiceAttestation>) -> Self {
        Self { xform, required_attestations }
    }
}

canonical_record! {
    ServiceDocument {
        xform: "xform",
        required_attestations: "requiredAttestations",
    }
}

/// A service announcing itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct ServiceRegistration {
    /// Short service name
    service_id: String,
    /// The service provider's address
    service_pm_address: Address,
    /// When the service starts
    service_start_date: Date,
    /// When the service ends (open-ended if `None`)
    service_end_date: Option<Date>,
    /// Display name
    service_marketing_name: String,
    /// Display description
    service_marketing_description: String,
    /// Display image (raw bytes, possibly empty)
    service_marketing_image: BinaryVec,
    /// The documents the service asks for
    documents: Vec<ServiceDocument>,
}

impl ServiceRegistration {
    /// Create a new service registration.
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>>(
        service_id: S,
        service_pm_address: Address,
        service_start_date: Date,
        service_end_date: Option<Date>,
        service_marketing_name: S,
        service_marketing_description: S,
        service_marketing_image: BinaryVec,
        documents: Vec<ServiceDocument>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            service_pm_address,
            service_start_date,
            service_end_date,
            service_marketing_name: service_marketing_name.into(),
            service_marketing_description: service_marketing_description.into(),
            service_marketing_image,
            documents,
        }
    }
}

canonical_record! {
    ServiceRegistration {
        service_id: "serviceId",
        service_pm_address: "servicePMAddress",
        service_start_date: "serviceStartDate",
        service_end_date: "serviceEndDate",
        service_marketing_name: "serviceMarketing_name",
        service_marketing_description: "serviceMarketing_description",
        service_marketing_image: "serviceMarketing_image",
        documents: "documents",
    }
}
