use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::config::Config;
use crate::models::user::UserRole;

const PLATFORM_NAME: &str = "Registre des centres d'accueil";

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    login_url: String,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self {
            transport,
            from,
            login_url: config.login_url(),
        })
    }

    // ─── Private helpers ─────────────────────────────────────────────────────

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    fn recipient(to_email: &str, to_name: &str) -> anyhow::Result<Mailbox> {
        format!("{to_name} <{to_email}>")
            .parse()
            .or_else(|_| to_email.parse())
            .with_context(|| format!("Invalid recipient address: {to_email}"))
    }

    /// Wraps inner HTML content in the platform layout.
    fn wrap_html(content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{PLATFORM_NAME}</title>
</head>
<body style="margin:0;padding:0;background-color:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Helvetica,Arial,sans-serif">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="background-color:#f1f5f9;padding:40px 16px">
    <tr>
      <td align="center">
        <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="max-width:520px">
          <tr>
            <td align="center" style="padding-bottom:28px">
              <p style="margin:0;font-size:20px;font-weight:700;color:#0f172a;text-align:center">{PLATFORM_NAME}</p>
            </td>
          </tr>
          <tr>
            <td style="background:#ffffff;border-radius:12px;padding:40px;box-shadow:0 1px 3px rgba(0,0,0,0.08),0 8px 24px rgba(0,0,0,0.04)">
              {content}
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#
        )
    }

    async fn send_email(&self, to: Mailbox, subject: &str, text: &str, html: &str) -> anyhow::Result<()> {
        let from = Mailbox::new(Some(PLATFORM_NAME.to_string()), self.from.email.clone());
        let email = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("Failed to send email")?;

        Ok(())
    }

    // ─── Public methods ───────────────────────────────────────────────────────

    /// Credentials of an account provisioned on verification or approval.
    pub async fn send_account_credentials(
        &self,
        to_email: &str,
        to_name: &str,
        role: UserRole,
        temporary_password: &str,
    ) -> anyhow::Result<()> {
        let to = Self::recipient(to_email, to_name)?;
        let login_url = &self.login_url;
        let role_fr = role.label_fr();

        let subject = format!("Votre compte {role_fr} a été activé");

        let text = format!(
            "Bonjour {to_name},\n\n\
            Votre demande a été validée. Un compte {role_fr} a été créé pour {to_email}.\n\n\
            Mot de passe temporaire : {temporary_password}\n\
            Vous devrez le changer à la première connexion.\n\n\
            Connexion : {login_url}\n\n\
            {PLATFORM_NAME}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Compte activé</h1>
<p style="margin:0 0 24px 0;font-size:15px;color:#64748b;line-height:1.6">Bonjour <strong style="color:#334155">{to_name}</strong>,<br><br>Votre demande a été validée. Un compte <strong style="color:#334155">{role_fr}</strong> a été créé pour <strong style="color:#334155">{to_email}</strong>.</p>
<table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="margin-bottom:24px">
  <tr>
    <td align="center" style="background:#f8fafc;border-radius:10px;border:1px solid #e2e8f0;padding:20px 16px">
      <span style="font-size:13px;color:#64748b">Mot de passe temporaire</span><br>
      <span style="font-size:24px;font-weight:700;letter-spacing:3px;color:#0f172a;font-family:monospace">{temporary_password}</span>
    </td>
  </tr>
</table>
<table role="presentation" cellpadding="0" cellspacing="0" style="margin-bottom:28px">
  <tr>
    <td style="border-radius:8px;background:#2563eb">
      <a href="{login_url}" style="display:inline-block;padding:13px 28px;color:#ffffff;text-decoration:none;font-weight:600;font-size:15px;border-radius:8px">Se connecter</a>
    </td>
  </tr>
</table>
<p style="margin:0;font-size:13px;color:#94a3b8;border-top:1px solid #f1f5f9;padding-top:20px;line-height:1.5">Vous devrez choisir un nouveau mot de passe à la première connexion.</p>"#
        );

        let html = Self::wrap_html(&content);
        self.send_email(to, &subject, &text, &html).await
    }

    /// Rejection of an orphanage registration or a partner request.
    pub async fn send_rejection(
        &self,
        to_email: &str,
        to_name: &str,
        request_label: &str,
        reason: Option<&str>,
    ) -> anyhow::Result<()> {
        let to = Self::recipient(to_email, to_name)?;
        let reason_text = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("Aucun motif précisé.");

        let subject = format!("Votre {request_label} n'a pas été retenue");

        let text = format!(
            "Bonjour {to_name},\n\n\
            Après examen, votre {request_label} n'a pas été retenue.\n\n\
            Motif : {reason_text}\n\n\
            {PLATFORM_NAME}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Demande non retenue</h1>
<p style="margin:0 0 20px 0;font-size:15px;color:#64748b;line-height:1.6">Bonjour <strong style="color:#334155">{to_name}</strong>,<br><br>Après examen, votre {request_label} n'a pas été retenue.</p>
<div style="background:#f8fafc;border-left:4px solid #dc2626;border-radius:4px;padding:16px 20px;margin-bottom:24px">
  <p style="margin:0;font-size:15px;color:#334155;line-height:1.6">{reason_text}</p>
</div>"#
        );

        let html = Self::wrap_html(&content);
        self.send_email(to, &subject, &text, &html).await
    }
}
