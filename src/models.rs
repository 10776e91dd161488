#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]

//! Domain records mapped out of workspace pages.
//!
//! Each record owns a `from_page` constructor that reads the page's property
//! map through [`crate::properties`]. Property names are looked up through
//! candidate lists because agency workspaces name the same column in several
//! ways (`Projet` vs `Nom`, accented vs plain).

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::properties as props;
use crate::store::PageRecord;

/// Declares a closed set of French workspace labels with an open tail.
///
/// The store keeps select and status options as free-form text configured by
/// the agency, so every enum carries an `Other` variant that passes unknown
/// labels through unchanged instead of failing the whole record.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
            /// A label the agency configured that this library does not model.
            Other(String),
        }

        impl $name {
            /// Parses the label stored in the workspace.
            #[must_use]
            pub fn from_wire(value: &str) -> Self {
                match value {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }

            /// The label as the workspace stores it.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(Self::from_wire(&value))
            }
        }
    };
}

wire_enum!(
    /// Lifecycle of a project.
    ProjectStatus {
        AwaitingValidation => "À valider",
        InProgress => "En cours",
        Paused => "En pause",
        Completed => "Terminé",
        Rejected => "Refusé",
    }
);

wire_enum!(
    /// Priority assigned to a project.
    Priority {
        Low => "Basse",
        Normal => "Normale",
        High => "Haute",
        Urgent => "Urgente",
    }
);

wire_enum!(
    /// Lifecycle of a deliverable, from draft to delivery.
    DeliverableStatus {
        InPreparation => "En préparation",
        AwaitingValidation => "À valider",
        Validated => "Validé",
        Rejected => "Refusé",
        Delivered => "Livré",
    }
);

wire_enum!(
    /// What kind of artifact a deliverable is.
    DeliverableKind {
        Document => "Document",
        Mockup => "Maquette",
        Code => "Code",
        Report => "Rapport",
        Misc => "Autre",
    }
);

wire_enum!(
    /// Payment state of an invoice.
    InvoiceStatus {
        Draft => "Brouillon",
        Sent => "Envoyée",
        Paid => "Payée",
        Overdue => "En retard",
        Cancelled => "Annulée",
    }
);

wire_enum!(
    /// Outcome of a client validation.
    ValidationStatus {
        Pending => "En attente",
        Approved => "Approuvé",
        Rejected => "Refusé",
        ChangesRequested => "À modifier",
    }
);

wire_enum!(
    /// What a validation request covers.
    ValidationKind {
        Mockup => "Maquette",
        Content => "Contenu",
        Feature => "Fonctionnalité",
        FinalDeliverable => "Livrable final",
    }
);

wire_enum!(
    /// Who wrote a comment.
    AuthorKind {
        Client => "client",
        Agency => "agence",
    }
);

/// A file attached to a record, either uploaded or externally linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
    /// `file` for uploads, `external` for links.
    pub kind: String,
}

/// A client account with a portal login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub nom: String,
    pub entreprise: String,
    pub email: String,
    pub email_secondaire: String,
    pub telephone: String,
    pub adresse: String,
    pub siret: String,
    pub numero_tva: String,
    pub portail_actif: bool,
}

impl Client {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        Self {
            id: page.id.clone(),
            nom: props::title(p, &["Client", "Nom", "nom", "Name"]),
            entreprise: props::rich_text(p, &["Entreprise", "entreprise"]),
            email: props::email(p, &["Email", "email"]),
            email_secondaire: props::email(p, &["EmailSecondaire", "emailSecondaire"]),
            telephone: props::phone(p, &["Telephone", "telephone"]),
            adresse: props::rich_text(p, &["Adresse", "adresse"]),
            siret: props::rich_text(p, &["SIRET", "siret"]),
            numero_tva: props::rich_text(p, &["NumeroTVA", "numeroTVA"]),
            portail_actif: props::checkbox(p, &["PortailActif", "portailActif"]),
        }
    }
}

/// A project the agency runs for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub nom: String,
    pub client_id: String,
    pub statut: ProjectStatus,
    pub date_debut: Option<String>,
    pub date_fin_estimee: Option<String>,
    pub date_fin: Option<String>,
    pub montant_total: f64,
    pub jours_estimes: f64,
    pub taux_journalier: f64,
    pub visible_portail: bool,
    pub description_publique: String,
    /// Progress in whole percent, 0 to 100.
    pub pourcentage_avancement: u32,
    pub tags: Vec<String>,
    pub priorite: Option<Priority>,
}

impl Project {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        // The amount lives in a plain number column in older workspaces and in
        // a formula column in newer ones.
        let mut montant_total = props::number(p, &["MontantTotal", "montantTotal"]);
        if montant_total == 0.0 {
            montant_total =
                props::formula_number(p, &["MontantTotal", "montantTotal"]).unwrap_or_default();
        }
        let avancement = props::number(
            p,
            &["PourcentageAvancement", "pourcentageAvancement", "Avancement"],
        );
        Self {
            id: page.id.clone(),
            nom: props::title(p, &["Projet", "Nom", "nom", "Name"]),
            client_id: props::first_relation(p, &["Client", "client"]).unwrap_or_default(),
            statut: ProjectStatus::from_wire(&props::status_or_select(p, &["Statut", "statut"])),
            date_debut: props::date(p, &["Date", "DateDebut", "dateDebut"]),
            date_fin_estimee: props::date(p, &["DateFinEstimee", "dateFinEstimee"]),
            date_fin: props::date(p, &["DateFin", "dateFin"]),
            montant_total,
            jours_estimes: props::number(p, &["JoursEstimes", "joursEstimes"]),
            taux_journalier: props::number(p, &["TauxJournalier", "tauxJournalier"]),
            visible_portail: props::checkbox(p, &["VisiblePortail", "visiblePortail"]),
            description_publique: props::rich_text(
                p,
                &["DescriptionPublique", "descriptionPublique"],
            ),
            pourcentage_avancement: (avancement * 100.0).round().max(0.0) as u32,
            tags: props::multi_select(p, &["Tags", "tags"]),
            priorite: parse_if_set(props::select(p, &["Priorite", "priorite"]), Priority::from_wire),
        }
    }
}

/// A piece of work delivered to the client for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: String,
    pub nom: String,
    pub description: String,
    pub projet_id: String,
    /// Display name of the owning project, resolved by the portal.
    pub projet_nom: String,
    pub client_id: String,
    pub statut: DeliverableStatus,
    pub kind: Option<DeliverableKind>,
    pub lot: String,
    pub version: String,
    pub fichier_precedent_id: Option<String>,
    pub fichiers: Vec<FileRef>,
    pub lien_externe: String,
    pub date_creation: String,
    pub date_livraison: Option<String>,
    pub date_validation: Option<String>,
    pub valide_par: String,
    pub commentaires_client: String,
    pub visible_portail: bool,
    /// Validation history, resolved by the portal for detail views.
    pub validations: Vec<Validation>,
}

impl Deliverable {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        let lot = non_empty_or(props::select(p, &["Lot", "lot"]), || {
            props::rich_text(p, &["Lot", "lot"])
        });
        let version = non_empty_or(props::rich_text(p, &["Version", "version"]), || {
            "1.0".to_string()
        });
        Self {
            id: page.id.clone(),
            nom: props::title(p, &["Nom", "nom", "Name"]),
            description: props::rich_text(p, &["Description", "description"]),
            projet_id: props::first_relation(p, &["Projet", "projet"]).unwrap_or_default(),
            projet_nom: String::new(),
            client_id: props::first_relation(p, &["Client", "client"]).unwrap_or_default(),
            statut: DeliverableStatus::from_wire(&props::select_or_status(
                p,
                &["Statut", "statut"],
            )),
            kind: parse_if_set(props::select(p, &["Type", "type"]), DeliverableKind::from_wire),
            lot,
            version,
            fichier_precedent_id: props::first_relation(
                p,
                &["FichierPrecedent", "fichierPrecedent"],
            ),
            fichiers: props::files(p, &["Fichiers", "fichiers", "Fichier", "fichier"]),
            lien_externe: props::url(p, &["LienExterne", "lienExterne"]),
            date_creation: page.created_time.clone(),
            date_livraison: props::date(p, &["DateLivraison", "dateLivraison"]),
            date_validation: props::date(p, &["DateValidation", "dateValidation"]),
            valide_par: props::rich_text(p, &["ValidePar", "validePar"]),
            commentaires_client: props::rich_text(p, &["CommentairesClient", "commentairesClient"]),
            visible_portail: props::checkbox(p, &["VisiblePortail", "visiblePortail"]),
            validations: Vec::new(),
        }
    }
}

/// An invoice issued to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub numero: String,
    pub client_id: String,
    pub projet_id: Option<String>,
    /// Display name of the related project, resolved by the portal.
    pub projet_nom: String,
    pub montant_ht: f64,
    pub taux_tva: f64,
    pub montant_tva: f64,
    pub montant_ttc: f64,
    pub date_emission: Option<String>,
    pub date_echeance: Option<String>,
    pub date_paiement: Option<String>,
    pub statut: InvoiceStatus,
    pub fichier_pdf: Option<String>,
    pub visible_portail: bool,
}

impl Invoice {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        let montant_ht = props::number(p, &["MontantHT", "montantHT", "Montant"]);
        // French VAT defaults to the standard 20% rate when the column is
        // empty or zero.
        let mut taux_tva = props::number(p, &["TauxTVA", "tauxTVA"]);
        if taux_tva == 0.0 {
            taux_tva = 20.0;
        }
        // Formula columns win over the computed amounts, but an empty formula
        // result falls back to the arithmetic.
        let montant_tva = props::formula_number(p, &["MontantTVA", "montantTVA"])
            .filter(|value| *value != 0.0)
            .unwrap_or(montant_ht * taux_tva / 100.0);
        let montant_ttc = props::formula_number(p, &["MontantTTC", "montantTTC"])
            .filter(|value| *value != 0.0)
            .unwrap_or(montant_ht * (1.0 + taux_tva / 100.0));
        let numero = non_empty_or(
            props::title(p, &["Facture", "Numero", "numero", "Nom", "Name"]),
            || props::rich_text(p, &["Numéro"]),
        );
        Self {
            id: page.id.clone(),
            numero,
            client_id: props::first_relation(p, &["Client", "client"]).unwrap_or_default(),
            projet_id: props::first_relation(p, &["📁 Projets", "Projet", "projet"]),
            projet_nom: String::new(),
            montant_ht,
            taux_tva,
            montant_tva,
            montant_ttc,
            date_emission: props::date(p, &["Date d'émission", "DateEmission", "dateEmission"]),
            date_echeance: props::date(p, &["Date d'échéance", "DateEcheance", "dateEcheance"]),
            date_paiement: props::date(p, &["DatePaiement", "datePaiement"]),
            statut: InvoiceStatus::from_wire(&props::select_or_status(p, &["Statut", "statut"])),
            fichier_pdf: props::files(p, &["PDF", "FichierPDF", "fichierPDF"])
                .into_iter()
                .next()
                .map(|file| file.url),
            visible_portail: props::checkbox(p, &["VisiblePortail", "visiblePortail"]),
        }
    }
}

/// A validation decision recorded against a deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub id: String,
    pub titre: String,
    pub livrable_id: String,
    pub projet_id: String,
    pub client_id: String,
    pub statut: ValidationStatus,
    pub date_creation: String,
    pub date_validation: Option<String>,
    pub commentaire: String,
    pub note_satisfaction: Option<f64>,
    pub kind: Option<ValidationKind>,
}

impl Validation {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        Self {
            id: page.id.clone(),
            titre: props::title(p, &["Titre", "titre", "Nom", "Name"]),
            livrable_id: props::first_relation(p, &["Livrable", "livrable"]).unwrap_or_default(),
            projet_id: props::first_relation(p, &["Projet", "projet"]).unwrap_or_default(),
            client_id: props::first_relation(p, &["Client", "client"]).unwrap_or_default(),
            statut: ValidationStatus::from_wire(&props::select(p, &["Statut", "statut"])),
            date_creation: page.created_time.clone(),
            date_validation: props::date(p, &["DateValidation", "dateValidation"]),
            commentaire: props::rich_text(p, &["Commentaire", "commentaire"]),
            note_satisfaction: props::opt_number(p, &["NoteSatisfaction", "noteSatisfaction"]),
            kind: parse_if_set(
                props::select(p, &["TypeValidation", "typeValidation"]),
                ValidationKind::from_wire,
            ),
        }
    }
}

/// A comment exchanged on a deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub livrable_id: String,
    pub auteur: String,
    pub auteur_kind: AuthorKind,
    pub contenu: String,
    pub date_creation: String,
}

impl Comment {
    #[must_use]
    pub fn from_page(page: &PageRecord) -> Self {
        let p = &page.properties;
        let raw_author = props::select(p, &["AuteurType", "auteurType"]);
        Self {
            id: page.id.clone(),
            livrable_id: props::first_relation(p, &["Livrable", "livrable"]).unwrap_or_default(),
            auteur: props::rich_text(p, &["Auteur", "auteur"]),
            auteur_kind: if raw_author.is_empty() {
                AuthorKind::Client
            } else {
                AuthorKind::from_wire(&raw_author)
            },
            contenu: props::rich_text(p, &["Contenu", "contenu"]),
            date_creation: page.created_time.clone(),
        }
    }
}

/// Counters shown at the top of the client dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub projets_actifs: usize,
    pub livrables_a_valider: usize,
    pub factures_impayees: usize,
    /// Total due across unpaid invoices, VAT included.
    pub montant_du: f64,
}

/// Which record an activity feed entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Livrable,
    Facture,
}

/// One entry of the dashboard activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    pub kind: ActivityKind,
    pub titre: String,
    pub description: String,
    pub date: String,
    /// Portal route the entry links to.
    pub lien: String,
}

/// Which record a deadline comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineKind {
    Facture,
    Projet,
}

/// An upcoming due date shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: String,
    pub kind: DeadlineKind,
    pub titre: String,
    pub date: String,
    pub statut: String,
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.is_empty() { fallback() } else { value }
}

fn parse_if_set<T>(value: String, parse: impl FnOnce(&str) -> T) -> Option<T> {
    if value.is_empty() { None } else { Some(parse(&value)) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::properties::{build, map_of};

    fn page(id: &str, properties: crate::properties::PropertyMap) -> PageRecord {
        PageRecord {
            id: id.to_string(),
            created_time: "2025-03-01T10:00:00.000Z".to_string(),
            last_edited_time: "2025-03-02T10:00:00.000Z".to_string(),
            properties,
        }
    }

    #[test]
    fn test_wire_enum_round_trip() {
        assert_eq!(ProjectStatus::from_wire("En cours"), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::InProgress.as_str(), "En cours");
        assert_eq!(ProjectStatus::InProgress.to_string(), "En cours");
        assert_eq!(InvoiceStatus::from_wire("Envoyée"), InvoiceStatus::Sent);
        assert_eq!(ValidationStatus::from_wire("À modifier"), ValidationStatus::ChangesRequested);
    }

    #[test]
    fn test_wire_enum_passes_unknown_labels_through() {
        let status = DeliverableStatus::from_wire("Archivé");
        assert_eq!(status, DeliverableStatus::Other("Archivé".to_string()));
        assert_eq!(status.as_str(), "Archivé");
    }

    #[test]
    fn test_wire_enum_serde_uses_labels() {
        let jsonified = serde_json::to_string(&InvoiceStatus::Paid).unwrap();
        assert_eq!(jsonified, "\"Payée\"");
        let parsed: InvoiceStatus = serde_json::from_str("\"En retard\"").unwrap();
        assert_eq!(parsed, InvoiceStatus::Overdue);
        let unknown: InvoiceStatus = serde_json::from_str("\"Provisionnée\"").unwrap();
        assert_eq!(unknown, InvoiceStatus::Other("Provisionnée".to_string()));
    }

    #[test]
    fn test_client_from_page_reads_candidate_names() {
        let record = page(
            "c1",
            map_of(vec![
                ("Client", build::title("Marie Dupont")),
                ("entreprise", build::rich_text("Dupont SARL")),
                ("Email", build::email(Some("marie@dupont.fr"))),
                ("telephone", build::phone(Some("+33 6 00 00 00 00"))),
                ("PortailActif", build::checkbox(true)),
            ]),
        );
        let client = Client::from_page(&record);
        assert_eq!(client.id, "c1");
        assert_eq!(client.nom, "Marie Dupont");
        assert_eq!(client.entreprise, "Dupont SARL");
        assert_eq!(client.email, "marie@dupont.fr");
        assert_eq!(client.telephone, "+33 6 00 00 00 00");
        assert!(client.portail_actif);
        assert_eq!(client.siret, "");
    }

    #[test]
    fn test_project_from_page() {
        let record = page(
            "p1",
            map_of(vec![
                ("Projet", build::title("Refonte du site")),
                ("Client", build::relation(&["c1"])),
                ("Statut", build::status(Some("En cours"))),
                ("Date", build::date(Some("2025-01-15"))),
                ("MontantTotal", build::number(12_000.0)),
                ("Avancement", build::number(0.656)),
                ("Tags", build::multi_select(&["web", "express"])),
                ("VisiblePortail", build::checkbox(true)),
            ]),
        );
        let project = Project::from_page(&record);
        assert_eq!(project.nom, "Refonte du site");
        assert_eq!(project.client_id, "c1");
        assert_eq!(project.statut, ProjectStatus::InProgress);
        assert_eq!(project.date_debut.as_deref(), Some("2025-01-15"));
        assert_eq!(project.montant_total, 12_000.0);
        assert_eq!(project.pourcentage_avancement, 66);
        assert_eq!(project.tags, vec!["web", "express"]);
        assert_eq!(project.priorite, None);
        assert!(project.visible_portail);
    }

    #[test]
    fn test_project_total_falls_back_to_formula() {
        let record = page(
            "p2",
            map_of(vec![
                ("Nom", build::title("Audit")),
                (
                    "MontantTotal",
                    json!({"formula": {"type": "number", "number": 4_800.0}}),
                ),
            ]),
        );
        assert_eq!(Project::from_page(&record).montant_total, 4_800.0);
    }

    #[test]
    fn test_deliverable_defaults() {
        let record = page(
            "d1",
            map_of(vec![
                ("Nom", build::title("Maquette accueil")),
                ("Projet", build::relation(&["p1"])),
                ("Statut", build::select(Some("À valider"))),
                ("Type", build::select(Some("Maquette"))),
            ]),
        );
        let deliverable = Deliverable::from_page(&record);
        assert_eq!(deliverable.projet_id, "p1");
        assert_eq!(deliverable.statut, DeliverableStatus::AwaitingValidation);
        assert_eq!(deliverable.kind, Some(DeliverableKind::Mockup));
        assert_eq!(deliverable.version, "1.0");
        assert_eq!(deliverable.date_creation, "2025-03-01T10:00:00.000Z");
        assert!(deliverable.validations.is_empty());
    }

    #[test]
    fn test_deliverable_lot_falls_back_to_text() {
        let record = page(
            "d2",
            map_of(vec![
                ("Nom", build::title("Spécifications")),
                ("Lot", build::rich_text("Lot 2")),
            ]),
        );
        assert_eq!(Deliverable::from_page(&record).lot, "Lot 2");
    }

    #[test]
    fn test_invoice_computes_amounts_when_formulas_missing() {
        let record = page(
            "f1",
            map_of(vec![
                ("Facture", build::title("FAC-2025-001")),
                ("MontantHT", build::number(1_000.0)),
                ("Statut", build::select(Some("Envoyée"))),
            ]),
        );
        let invoice = Invoice::from_page(&record);
        assert_eq!(invoice.numero, "FAC-2025-001");
        assert_eq!(invoice.taux_tva, 20.0);
        assert_eq!(invoice.montant_tva, 200.0);
        assert_eq!(invoice.montant_ttc, 1_200.0);
        assert_eq!(invoice.statut, InvoiceStatus::Sent);
        assert_eq!(invoice.fichier_pdf, None);
    }

    #[test]
    fn test_invoice_prefers_formula_amounts() {
        let record = page(
            "f2",
            map_of(vec![
                ("Numéro", build::rich_text("FAC-2025-002")),
                ("MontantHT", build::number(1_000.0)),
                ("TauxTVA", build::number(5.5)),
                (
                    "MontantTVA",
                    json!({"formula": {"type": "number", "number": 55.0}}),
                ),
                (
                    "MontantTTC",
                    json!({"formula": {"type": "number", "number": 1_055.0}}),
                ),
                ("📁 Projets", build::relation(&["p1"])),
            ]),
        );
        let invoice = Invoice::from_page(&record);
        assert_eq!(invoice.numero, "FAC-2025-002");
        assert_eq!(invoice.taux_tva, 5.5);
        assert_eq!(invoice.montant_tva, 55.0);
        assert_eq!(invoice.montant_ttc, 1_055.0);
        assert_eq!(invoice.projet_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_validation_from_page() {
        let record = page(
            "v1",
            map_of(vec![
                ("Titre", build::title("Validation par Marie - 01/03/2025")),
                ("Livrable", build::relation(&["d1"])),
                ("Statut", build::select(Some("Approuvé"))),
                ("NoteSatisfaction", build::number(4.5)),
                ("TypeValidation", build::select(Some("Livrable final"))),
            ]),
        );
        let validation = Validation::from_page(&record);
        assert_eq!(validation.livrable_id, "d1");
        assert_eq!(validation.statut, ValidationStatus::Approved);
        assert_eq!(validation.note_satisfaction, Some(4.5));
        assert_eq!(validation.kind, Some(ValidationKind::FinalDeliverable));
    }

    #[test]
    fn test_comment_author_defaults_to_client() {
        let record = page(
            "m1",
            map_of(vec![
                ("Livrable", build::relation(&["d1"])),
                ("Auteur", build::rich_text("Marie")),
                ("Contenu", build::rich_text("Très bien, merci")),
            ]),
        );
        let comment = Comment::from_page(&record);
        assert_eq!(comment.auteur_kind, AuthorKind::Client);
        assert_eq!(comment.contenu, "Très bien, merci");
    }

    #[test]
    fn test_activity_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ActivityKind::Livrable).unwrap(), "\"livrable\"");
        assert_eq!(serde_json::to_string(&DeadlineKind::Facture).unwrap(), "\"facture\"");
    }
}
