//! High-level portal facade over the workspace store.
//!
//! Every read takes the id of the signed-in client and scopes the underlying
//! query to records that belong to that client and are flagged visible, so a
//! guessed URL never exposes another client's data. Writes go through the
//! same store handle. Content trees are fetched through [`crate::content`]
//! and keep its fail-soft contract.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::config::{DatabaseIds, PortalConfig};
use crate::content::block::Blocks;
use crate::content::fetch::{FetchLimits, fetch_content_tree};
use crate::error::{PortalError, PortalResult};
use crate::models::{
    ActivityItem, ActivityKind, AuthorKind, Client, Comment, DashboardStats, Deadline,
    DeadlineKind, Deliverable, DeliverableStatus, Invoice, InvoiceStatus, Project, ProjectStatus,
    Validation, ValidationKind, ValidationStatus,
};
use crate::properties::{build, map_of};
use crate::store::http::HttpStore;
use crate::store::{DatabaseQuery, SortDirection, WorkspaceStore, filter};

/// Entries taken from each source when building the activity feed.
const RECENT_PER_SOURCE: usize = 5;

/// Profile fields a client may edit; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub nom: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
}

/// A validation decision submitted from a deliverable page.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub deliverable_id: String,
    pub project_id: String,
    pub client_id: String,
    pub statut: ValidationStatus,
    pub commentaire: Option<String>,
    pub note_satisfaction: Option<f64>,
    pub kind: ValidationKind,
}

impl ValidationRequest {
    #[must_use]
    pub fn new(
        deliverable_id: impl Into<String>,
        project_id: impl Into<String>,
        client_id: impl Into<String>,
        statut: ValidationStatus,
    ) -> Self {
        Self {
            deliverable_id: deliverable_id.into(),
            project_id: project_id.into(),
            client_id: client_id.into(),
            statut,
            commentaire: None,
            note_satisfaction: None,
            kind: ValidationKind::FinalDeliverable,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.commentaire = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_satisfaction(mut self, note: f64) -> Self {
        self.note_satisfaction = Some(note);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ValidationKind) -> Self {
        self.kind = kind;
        self
    }
}

/// The portal's data layer, bound to one workspace.
pub struct Portal {
    store: Arc<dyn WorkspaceStore>,
    databases: DatabaseIds,
    limits: FetchLimits,
}

impl Portal {
    #[must_use]
    pub fn new(store: Arc<dyn WorkspaceStore>, databases: DatabaseIds) -> Self {
        Self {
            store,
            databases,
            limits: FetchLimits::default(),
        }
    }

    /// Bound content fetches with other limits than the defaults.
    #[must_use]
    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Stand the portal up against the hosted store described by `config`.
    #[must_use]
    pub fn from_config(config: &PortalConfig) -> Self {
        let store = HttpStore::new(&config.api_key)
            .with_base_url(&config.base_url)
            .with_api_version(&config.api_version);
        Self {
            store: Arc::new(store),
            databases: config.databases.clone(),
            limits: config.limits,
        }
    }

    // ----- clients -----

    /// Look a client up by the email address used to sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the clients database cannot be queried.
    pub async fn client_by_email(&self, email: &str) -> PortalResult<Option<Client>> {
        let query = DatabaseQuery::filtered(filter::email_equals("Email", email));
        let page = self
            .store
            .query_database(&self.databases.clients, query)
            .await?;
        Ok(page.results.first().map(Client::from_page))
    }

    /// Fetch a client record, `None` when the page no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error on any store failure other than a missing page.
    pub async fn client_by_id(&self, client_id: &str) -> PortalResult<Option<Client>> {
        match self.store.retrieve_page(client_id).await {
            Ok(page) => Ok(Some(Client::from_page(&page))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Update the profile fields a client may edit, leaving the rest alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected by the store.
    pub async fn update_client_profile(
        &self,
        client_id: &str,
        update: ProfileUpdate,
    ) -> PortalResult<Client> {
        let mut entries = Vec::new();
        if let Some(nom) = &update.nom {
            entries.push(("Nom", build::title(nom)));
        }
        if let Some(telephone) = &update.telephone {
            entries.push(("Telephone", build::phone(Some(telephone))));
        }
        if let Some(adresse) = &update.adresse {
            entries.push(("Adresse", build::rich_text(adresse)));
        }
        let page = self.store.update_page(client_id, map_of(entries)).await?;
        Ok(Client::from_page(&page))
    }

    // ----- projects -----

    /// All portal-visible projects of the client, newest start date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects database cannot be queried.
    pub async fn client_projects(&self, client_id: &str) -> PortalResult<Vec<Project>> {
        let query = DatabaseQuery::filtered(filter::and(vec![
            filter::relation_contains("Client", client_id),
            filter::checkbox_equals("VisiblePortail", true),
        ]))
        .sort_by_property("Date", SortDirection::Descending);
        let page = self
            .store
            .query_database(&self.databases.projects, query)
            .await?;
        Ok(page.results.iter().map(Project::from_page).collect())
    }

    /// Fetch one project, `None` unless it belongs to the client and is
    /// flagged visible.
    ///
    /// # Errors
    ///
    /// Returns an error on any store failure other than a missing page.
    pub async fn project_by_id(
        &self,
        project_id: &str,
        client_id: &str,
    ) -> PortalResult<Option<Project>> {
        let page = match self.store.retrieve_page(project_id).await {
            Ok(page) => page,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let project = Project::from_page(&page);
        if project.client_id != client_id || !project.visible_portail {
            return Ok(None);
        }
        Ok(Some(project))
    }

    /// Number of the client's visible projects currently in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects database cannot be queried.
    pub async fn active_project_count(&self, client_id: &str) -> PortalResult<usize> {
        let query = DatabaseQuery::filtered(filter::and(vec![
            filter::relation_contains("Client", client_id),
            filter::checkbox_equals("VisiblePortail", true),
            filter::status_equals("Statut", ProjectStatus::InProgress.as_str()),
        ]));
        let page = self
            .store
            .query_database(&self.databases.projects, query)
            .await?;
        Ok(page.results.len())
    }

    // ----- deliverables -----

    /// All visible deliverables across the client's visible projects, newest
    /// first, with project names attached.
    ///
    /// # Errors
    ///
    /// Returns an error if either involved database cannot be queried.
    pub async fn client_deliverables(&self, client_id: &str) -> PortalResult<Vec<Deliverable>> {
        let projects = self.client_projects(client_id).await?;
        if projects.is_empty() {
            return Ok(Vec::new());
        }
        let clauses = projects
            .iter()
            .map(|project| filter::relation_contains("Projet", &project.id))
            .collect();
        let query = DatabaseQuery::filtered(filter::and(vec![
            filter::or(clauses),
            filter::checkbox_equals("VisiblePortail", true),
        ]))
        .sort_by_created_time(SortDirection::Descending);
        let page = self
            .store
            .query_database(&self.databases.deliverables, query)
            .await?;

        let names: HashMap<&str, &str> = projects
            .iter()
            .map(|project| (project.id.as_str(), project.nom.as_str()))
            .collect();
        let mut deliverables: Vec<Deliverable> =
            page.results.iter().map(Deliverable::from_page).collect();
        for deliverable in &mut deliverables {
            deliverable.projet_nom = names
                .get(deliverable.projet_id.as_str())
                .copied()
                .unwrap_or_default()
                .to_string();
        }
        Ok(deliverables)
    }

    /// Visible deliverables of one project, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Forbidden`] when the project does not belong to
    /// the client, or an error if a query fails.
    pub async fn project_deliverables(
        &self,
        project_id: &str,
        client_id: &str,
    ) -> PortalResult<Vec<Deliverable>> {
        let project = self
            .project_by_id(project_id, client_id)
            .await?
            .ok_or_else(|| {
                PortalError::forbidden(format!("project {project_id} is not accessible"))
            })?;
        let query = DatabaseQuery::filtered(filter::and(vec![
            filter::relation_contains("Projet", project_id),
            filter::checkbox_equals("VisiblePortail", true),
        ]))
        .sort_by_created_time(SortDirection::Descending);
        let page = self
            .store
            .query_database(&self.databases.deliverables, query)
            .await?;
        let mut deliverables: Vec<Deliverable> =
            page.results.iter().map(Deliverable::from_page).collect();
        for deliverable in &mut deliverables {
            deliverable.projet_nom.clone_from(&project.nom);
        }
        Ok(deliverables)
    }

    /// Fetch one deliverable with its validation history, `None` unless it is
    /// visible and reachable through one of the client's projects.
    ///
    /// # Errors
    ///
    /// Returns an error on store failures other than missing pages.
    pub async fn deliverable_by_id(
        &self,
        deliverable_id: &str,
        client_id: &str,
    ) -> PortalResult<Option<Deliverable>> {
        let page = match self.store.retrieve_page(deliverable_id).await {
            Ok(page) => page,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut deliverable = Deliverable::from_page(&page);
        let Some(project) = self
            .project_by_id(&deliverable.projet_id, client_id)
            .await?
        else {
            return Ok(None);
        };
        if !deliverable.visible_portail {
            return Ok(None);
        }
        deliverable.projet_nom = project.nom;
        deliverable.validations = self.deliverable_validations(deliverable_id).await?;
        Ok(Some(deliverable))
    }

    /// The client's deliverables waiting for a validation decision.
    ///
    /// # Errors
    ///
    /// Same contract as [`Portal::client_deliverables`].
    pub async fn pending_deliverables(&self, client_id: &str) -> PortalResult<Vec<Deliverable>> {
        let mut deliverables = self.client_deliverables(client_id).await?;
        deliverables.retain(|d| d.statut == DeliverableStatus::AwaitingValidation);
        Ok(deliverables)
    }

    /// # Errors
    ///
    /// Same contract as [`Portal::client_deliverables`].
    pub async fn pending_deliverable_count(&self, client_id: &str) -> PortalResult<usize> {
        Ok(self.pending_deliverables(client_id).await?.len())
    }

    /// Move a deliverable to `statut`, stamping the validation date when it
    /// becomes validated and recording an optional client comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected by the store.
    pub async fn update_deliverable_status(
        &self,
        deliverable_id: &str,
        statut: DeliverableStatus,
        comment: Option<&str>,
    ) -> PortalResult<()> {
        let mut entries = vec![("Statut", build::select(Some(statut.as_str())))];
        if statut == DeliverableStatus::Validated {
            entries.push(("DateValidation", build::date(Some(&now_stamp()))));
        }
        if let Some(text) = comment.filter(|text| !text.is_empty()) {
            entries.push(("CommentairesClient", build::rich_text(text)));
        }
        self.store
            .update_page(deliverable_id, map_of(entries))
            .await?;
        Ok(())
    }

    // ----- invoices -----

    /// All visible invoices of the client, newest emission date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoices database cannot be queried.
    pub async fn client_invoices(&self, client_id: &str) -> PortalResult<Vec<Invoice>> {
        let query = DatabaseQuery::filtered(filter::and(vec![
            filter::relation_contains("Client", client_id),
            filter::checkbox_equals("VisiblePortail", true),
        ]))
        .sort_by_property("Date d'émission", SortDirection::Descending);
        let page = self
            .store
            .query_database(&self.databases.invoices, query)
            .await?;
        Ok(page.results.iter().map(Invoice::from_page).collect())
    }

    /// Fetch one invoice, `None` unless it belongs to the client and is
    /// flagged visible.
    ///
    /// # Errors
    ///
    /// Returns an error on any store failure other than a missing page.
    pub async fn invoice_by_id(
        &self,
        invoice_id: &str,
        client_id: &str,
    ) -> PortalResult<Option<Invoice>> {
        let page = match self.store.retrieve_page(invoice_id).await {
            Ok(page) => page,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let invoice = Invoice::from_page(&page);
        if invoice.client_id != client_id || !invoice.visible_portail {
            return Ok(None);
        }
        Ok(Some(invoice))
    }

    /// Invoices that are sent or overdue, newest first.
    ///
    /// # Errors
    ///
    /// Same contract as [`Portal::client_invoices`].
    pub async fn unpaid_invoices(&self, client_id: &str) -> PortalResult<Vec<Invoice>> {
        let mut invoices = self.client_invoices(client_id).await?;
        invoices.retain(|invoice| {
            matches!(invoice.statut, InvoiceStatus::Sent | InvoiceStatus::Overdue)
        });
        Ok(invoices)
    }

    /// # Errors
    ///
    /// Same contract as [`Portal::client_invoices`].
    pub async fn unpaid_invoice_count(&self, client_id: &str) -> PortalResult<usize> {
        Ok(self.unpaid_invoices(client_id).await?.len())
    }

    /// Total due across unpaid invoices, VAT included.
    ///
    /// # Errors
    ///
    /// Same contract as [`Portal::client_invoices`].
    pub async fn total_unpaid_amount(&self, client_id: &str) -> PortalResult<f64> {
        let invoices = self.unpaid_invoices(client_id).await?;
        Ok(invoices.iter().map(|invoice| invoice.montant_ttc).sum())
    }

    // ----- validations -----

    /// Record a validation decision and move the deliverable accordingly.
    ///
    /// Writes a validation page titled after the deciding client and the
    /// current date, then cascades onto the deliverable: approval validates
    /// it, rejection rejects it, a change request sends it back to waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if either write is rejected by the store.
    pub async fn create_validation(&self, request: ValidationRequest) -> PortalResult<Validation> {
        let client = self.client_by_id(&request.client_id).await?;
        let validator = client
            .map(|c| c.nom)
            .filter(|nom| !nom.is_empty())
            .unwrap_or_else(|| "Client".to_string());
        let now = Utc::now();
        let titre = format!("Validation par {validator} - {}", now.format("%d/%m/%Y"));
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let commentaire = request.commentaire.as_deref().filter(|c| !c.is_empty());

        let mut entries = vec![
            ("Titre", build::title(&titre)),
            ("Livrable", build::relation(&[request.deliverable_id.as_str()])),
            ("Projet", build::relation(&[request.project_id.as_str()])),
            ("Client", build::relation(&[request.client_id.as_str()])),
            ("Statut", build::select(Some(request.statut.as_str()))),
            ("DateValidation", build::date(Some(&stamp))),
            ("TypeValidation", build::select(Some(request.kind.as_str()))),
        ];
        if let Some(text) = commentaire {
            entries.push(("Commentaire", build::rich_text(text)));
        }
        if let Some(note) = request.note_satisfaction {
            entries.push(("NoteSatisfaction", build::number(note)));
        }
        let created = self
            .store
            .create_page(&self.databases.validations, map_of(entries))
            .await?;

        let cascade = match request.statut {
            ValidationStatus::Approved => DeliverableStatus::Validated,
            ValidationStatus::Rejected => DeliverableStatus::Rejected,
            _ => DeliverableStatus::AwaitingValidation,
        };
        let mut update = vec![
            ("Statut", build::select(Some(cascade.as_str()))),
            ("DateValidation", build::date(Some(&stamp))),
            ("ValidePar", build::rich_text(&validator)),
        ];
        if let Some(text) = commentaire {
            update.push(("CommentairesClient", build::rich_text(text)));
        }
        self.store
            .update_page(&request.deliverable_id, map_of(update))
            .await?;

        Ok(Validation::from_page(&created))
    }

    /// Validation history of a deliverable, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the validations database cannot be queried.
    pub async fn deliverable_validations(
        &self,
        deliverable_id: &str,
    ) -> PortalResult<Vec<Validation>> {
        let query = DatabaseQuery::filtered(filter::relation_contains("Livrable", deliverable_id))
            .sort_by_created_time(SortDirection::Descending);
        let page = self
            .store
            .query_database(&self.databases.validations, query)
            .await?;
        Ok(page.results.iter().map(Validation::from_page).collect())
    }

    // ----- comments -----

    /// Conversation on a deliverable, oldest first. Yields an empty list when
    /// the workspace has no comments database.
    ///
    /// # Errors
    ///
    /// Returns an error if the comments database cannot be queried.
    pub async fn deliverable_comments(&self, deliverable_id: &str) -> PortalResult<Vec<Comment>> {
        let Some(database_id) = &self.databases.comments else {
            return Ok(Vec::new());
        };
        let query = DatabaseQuery::filtered(filter::relation_contains("Livrable", deliverable_id))
            .sort_by_created_time(SortDirection::Ascending);
        let page = self.store.query_database(database_id, query).await?;
        Ok(page.results.iter().map(Comment::from_page).collect())
    }

    /// Add a comment to a deliverable's conversation.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::CommentsNotConfigured`] when the workspace has
    /// no comments database, or an error if the write is rejected.
    pub async fn create_comment(
        &self,
        deliverable_id: &str,
        auteur: &str,
        auteur_kind: AuthorKind,
        contenu: &str,
    ) -> PortalResult<Comment> {
        let Some(database_id) = &self.databases.comments else {
            return Err(PortalError::CommentsNotConfigured);
        };
        let entries = vec![
            ("Livrable", build::relation(&[deliverable_id])),
            ("Auteur", build::rich_text(auteur)),
            ("AuteurType", build::select(Some(auteur_kind.as_str()))),
            ("Contenu", build::rich_text(contenu)),
        ];
        let created = self.store.create_page(database_id, map_of(entries)).await?;
        Ok(Comment::from_page(&created))
    }

    // ----- dashboard -----

    /// Counters for the dashboard header.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fails.
    pub async fn dashboard_stats(&self, client_id: &str) -> PortalResult<DashboardStats> {
        let projets_actifs = self.active_project_count(client_id).await?;
        let livrables_a_valider = self.pending_deliverable_count(client_id).await?;
        let unpaid = self.unpaid_invoices(client_id).await?;
        Ok(DashboardStats {
            projets_actifs,
            livrables_a_valider,
            factures_impayees: unpaid.len(),
            montant_du: unpaid.iter().map(|invoice| invoice.montant_ttc).sum(),
        })
    }

    /// Latest deliverables and invoices merged into one feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fails.
    pub async fn recent_activity(
        &self,
        client_id: &str,
        limit: usize,
    ) -> PortalResult<Vec<ActivityItem>> {
        let deliverables = self.client_deliverables(client_id).await?;
        let invoices = self.client_invoices(client_id).await?;

        let mut items = Vec::new();
        for deliverable in deliverables.iter().take(RECENT_PER_SOURCE) {
            items.push(ActivityItem {
                id: deliverable.id.clone(),
                kind: ActivityKind::Livrable,
                titre: deliverable.nom.clone(),
                description: format!(
                    "Livrable {} - {}",
                    deliverable.statut.as_str().to_lowercase(),
                    deliverable.projet_nom
                ),
                date: deliverable.date_creation.clone(),
                lien: format!("/livrables/{}", deliverable.id),
            });
        }
        for invoice in invoices.iter().take(RECENT_PER_SOURCE) {
            items.push(ActivityItem {
                id: invoice.id.clone(),
                kind: ActivityKind::Facture,
                titre: invoice.numero.clone(),
                description: format!(
                    "Facture {} - {:.2}€",
                    invoice.statut.as_str().to_lowercase(),
                    invoice.montant_ttc
                ),
                date: invoice.date_emission.clone().unwrap_or_default(),
                lien: format!("/factures/{}", invoice.id),
            });
        }
        items.sort_by(|a, b| parse_instant(&b.date).cmp(&parse_instant(&a.date)));
        items.truncate(limit);
        Ok(items)
    }

    /// Unpaid invoice due dates and in-progress project end dates that are
    /// still ahead, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fails.
    pub async fn upcoming_deadlines(
        &self,
        client_id: &str,
        limit: usize,
    ) -> PortalResult<Vec<Deadline>> {
        let invoices = self.unpaid_invoices(client_id).await?;
        let projects = self.client_projects(client_id).await?;

        let mut deadlines = Vec::new();
        for invoice in &invoices {
            deadlines.push(Deadline {
                id: invoice.id.clone(),
                kind: DeadlineKind::Facture,
                titre: format!("Facture {}", invoice.numero),
                date: invoice.date_echeance.clone().unwrap_or_default(),
                statut: invoice.statut.to_string(),
            });
        }
        for project in &projects {
            if project.statut != ProjectStatus::InProgress {
                continue;
            }
            let Some(date) = project.date_fin_estimee.clone() else {
                continue;
            };
            deadlines.push(Deadline {
                id: project.id.clone(),
                kind: DeadlineKind::Projet,
                titre: project.nom.clone(),
                date,
                statut: project.statut.to_string(),
            });
        }
        let now = Utc::now();
        deadlines.retain(|deadline| parse_instant(&deadline.date).is_some_and(|when| when >= now));
        deadlines.sort_by(|a, b| parse_instant(&a.date).cmp(&parse_instant(&b.date)));
        deadlines.truncate(limit);
        Ok(deadlines)
    }

    // ----- content -----

    /// Fetch the content tree of a page, bounded by the portal's limits.
    ///
    /// Fail-soft: store failures are logged and yield an empty forest, never
    /// an error.
    pub async fn page_content(&self, page_id: &str) -> Blocks {
        fetch_content_tree(self.store.as_ref(), page_id, self.limits).await
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Records carry either full RFC 3339 instants or date-only strings.
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
