use std::sync::Arc;

use chrono::{DateTime, Local};
use db::{
    DBService,
    models::notification::{CreateNotification, Notification, NotificationType},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    client_info::{ClientHints, ClientInfo, parse_client},
    geolocation::{IpInfo, IpLookup, lookup_or_unavailable},
};

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// The authenticated user on whose behalf a notification is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Actor {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl Actor {
    /// Full name when known, email otherwise.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// Caller details used to enrich authentication events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub hints: ClientHints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct NotificationMetadata {
    pub title: Option<String>,
    pub status: Option<String>,
    pub request: Option<RequestContext>,
}

impl NotificationMetadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// Location and device resolved for an authentication event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDetails {
    pub ip: IpInfo,
    pub client: ClientInfo,
}

impl AuthDetails {
    pub fn unavailable() -> Self {
        Self {
            ip: IpInfo::unavailable(),
            client: ClientInfo {
                browser_name: None,
                browser_version: None,
                os: None,
            },
        }
    }
}

fn auth_message(action: &str, author: &str, details: &AuthDetails, time: &str) -> String {
    format!(
        "{action} par {author} depuis {}, {} ({}).\nAppareil : {} sur {}.\nDate : {time}.",
        details.ip.city,
        details.ip.country,
        details.ip.ip,
        details.client.browser_label(),
        details.client.os_label(),
    )
}

/// Renders message, icon and color for a business event.
pub fn compose(
    event_type: NotificationType,
    author: &str,
    metadata: &NotificationMetadata,
    auth: Option<&AuthDetails>,
    now: DateTime<Local>,
) -> CreateNotification {
    let time = now.format(DATE_FORMAT).to_string();
    let title = metadata.title.as_deref().unwrap_or_default();
    let unavailable = AuthDetails::unavailable();
    let auth = auth.unwrap_or(&unavailable);

    let (message, icon, color) = match event_type {
        NotificationType::NoteCreated => (
            format!("Votre note \"{title}\" a été créée avec succès le {time}."),
            "✅",
            "#FF570A",
        ),
        NotificationType::NoteModified => (
            format!("La note \"{title}\" a été mise à jour avec succès le {time}."),
            "✏️",
            "#FF570A",
        ),
        NotificationType::NoteDeleted => (
            format!(
                "La note \"{title}\" a été supprimée le {time}. Cette action est irréversible."
            ),
            "⚠️",
            "#D80536",
        ),
        NotificationType::TaskCreated => (
            format!("Tâche ‘{title}’ ajoutée par {author} le {time}."),
            "✅",
            "#198754",
        ),
        NotificationType::TaskModified => (
            format!("Tâche ‘{title}’ mise à jour par {author} le {time}."),
            "✏️",
            "#FF570A",
        ),
        NotificationType::TaskDeleted => (
            format!("Tâche ‘{title}’ supprimée par {author} le {time}."),
            "🗑️",
            "#D80536",
        ),
        NotificationType::ProjectSubmitted => (
            format!(
                "Votre projet \"{title}\" a bien été soumis pour audit. Vous recevrez une réponse prochainement."
            ),
            "🚀",
            "#4EA8FF",
        ),
        NotificationType::ProjectStatusUpdated => (
            format!(
                "Le statut de votre projet \"{title}\" est passé à \"{}\".",
                metadata.status.as_deref().unwrap_or_default()
            ),
            "🔄",
            "#FFC107",
        ),
        NotificationType::UserSignup => (
            auth_message("Nouvelle inscription", author, auth, &time),
            "🎉",
            "#198754",
        ),
        NotificationType::UserLogin => (
            auth_message("Connexion réussie", author, auth, &time),
            "🔑",
            "#4EA8FF",
        ),
        NotificationType::PasswordReset => (
            auth_message("Mot de passe réinitialisé", author, auth, &time),
            "🔒",
            "#198754",
        ),
    };

    CreateNotification {
        notification_type: event_type,
        message,
        icon: icon.to_string(),
        color: color.to_string(),
    }
}

/// Composes and stores notifications. Failures never reach the caller.
#[derive(Clone)]
pub struct NotificationService {
    db: DBService,
    ip_lookup: Arc<dyn IpLookup>,
    enrichment_enabled: bool,
}

impl NotificationService {
    pub fn new(db: DBService, ip_lookup: Arc<dyn IpLookup>, enrichment_enabled: bool) -> Self {
        Self {
            db,
            ip_lookup,
            enrichment_enabled,
        }
    }

    async fn auth_details(&self, request: Option<&RequestContext>) -> AuthDetails {
        if !self.enrichment_enabled {
            return AuthDetails::unavailable();
        }
        let empty = RequestContext::default();
        let request = request.unwrap_or(&empty);
        let ip = lookup_or_unavailable(self.ip_lookup.as_ref(), request.ip.as_deref()).await;
        let client = parse_client(request.user_agent.as_deref(), &request.hints);
        AuthDetails { ip, client }
    }

    pub async fn create_notification(
        &self,
        actor: &Actor,
        event_type: NotificationType,
        metadata: NotificationMetadata,
    ) {
        let auth = if event_type.is_auth_event() {
            Some(self.auth_details(metadata.request.as_ref()).await)
        } else {
            None
        };

        let data = compose(
            event_type,
            &actor.display_name(),
            &metadata,
            auth.as_ref(),
            Local::now(),
        );

        if let Err(err) = Notification::create(&self.db.pool, actor.user_id, &data).await {
            tracing::error!(
                user_id = %actor.user_id,
                notification_type = %event_type,
                error = %err,
                "Error creating notification"
            );
        }
    }
}
