//! Employee-added mail, queued for out-of-band delivery.

use log::{info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::errors::NotifyError;
use crate::models::company::Company;
use crate::models::employee::Employee;

/// Tells a company that one of its employees was created.
#[derive(Debug, Clone)]
pub struct EmployeeAdded {
    pub employee: Employee,
    pub company: Company,
}

pub trait Notifier: Send + Sync {
    /// Enqueues without waiting for delivery.
    fn notify(&self, notification: EmployeeAdded) -> Result<(), NotifyError>;
}

pub struct QueueNotifier {
    tx: UnboundedSender<EmployeeAdded>,
}

/// Creates the notifier and the receiving end its consumer drains.
pub fn queue() -> (QueueNotifier, UnboundedReceiver<EmployeeAdded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueNotifier { tx }, rx)
}

impl Notifier for QueueNotifier {
    fn notify(&self, notification: EmployeeAdded) -> Result<(), NotifyError> {
        self.tx.send(notification).map_err(|_| NotifyError::QueueClosed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Renders the mail for `notification`; `None` when the company has no address.
    pub fn employee_added(notification: &EmployeeAdded, app_name: &str) -> Option<Self> {
        let EmployeeAdded { employee, company } = notification;
        let to = company.email.clone()?;

        let mut contact = Vec::new();
        if let Some(email) = &employee.email {
            contact.push(format!("- **Email:** {}", email));
        }
        if let Some(phone) = &employee.phone {
            contact.push(format!("- **Phone:** {}", phone));
        }
        if contact.is_empty() {
            contact.push("Contact information not provided".to_string());
        }

        let body = format!(
            "# Hello!\n\n\
             We have some exciting news to share with you.\n\n\
             **{} {}** has been successfully added to **{}**.\n\n\
             ## Contact Information\n{}\n\n\
             If you have any questions or need to make any changes, please don't hesitate to reach out.\n\n\
             Sincerely,\n{} Team\n",
            employee.first_name,
            employee.last_name,
            company.name,
            contact.join("\n"),
            app_name,
        );

        Some(MailMessage {
            to,
            subject: "New Employee Added".to_string(),
            body,
        })
    }
}

/// Drains the queue, rendering each notification and handing it to the mail transport.
pub fn spawn_mailer(mut rx: UnboundedReceiver<EmployeeAdded>, app_name: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            match MailMessage::employee_added(&notification, &app_name) {
                Some(mail) => info!(
                    "Delivering \"{}\" to {} for employee {}",
                    mail.subject, mail.to, notification.employee.id
                ),
                None => warn!(
                    "Company {} has no email address, skipping employee {} notification",
                    notification.company.id, notification.employee.id
                ),
            }
        }
        info!("Notification queue closed");
    })
}
