//! Defect notification rendering.
//!
//! Produces the subject line and styled HTML body announcing a newly
//! reported defect. Priorities run 1 (worst) to 6; 1 and 2 are treated
//! as urgent and change both the subject prefix and the banner styling.

use serde::{Deserialize, Serialize};

const PORTAL_URL: &str = "https://maintenance-admin.vercel.app";

/// A reported maintenance defect, as submitted by the field app.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Defect {
    pub id: String,
    pub title: String,
    pub description: String,
    pub asset: String,
    pub category: String,
    pub priority: u8,
    pub status: String,
    pub submitted_by: String,
}

impl Defect {
    pub fn is_urgent(&self) -> bool {
        self.priority == 1 || self.priority == 2
    }

    pub fn priority_label(&self) -> &'static str {
        match self.priority {
            1 => "Dangerous",
            2 => "Major",
            3 => "Routine",
            4 => "Minor",
            5 => "Cosmetic",
            6 => "Improvement / Preventative maintenance",
            _ => "Unknown",
        }
    }

    pub fn priority_color(&self) -> &'static str {
        match self.priority {
            1 => "#ff4d4d",
            2 => "#ff944d",
            3 => "#ffd24d",
            4 => "#4da6ff",
            5 => "#d9d9d9",
            6 => "#3cb371",
            _ => "#666",
        }
    }

    pub fn subject(&self) -> String {
        if self.is_urgent() {
            format!(
                "\u{1F6A8} URGENT: {} Defect Reported - {}",
                self.priority_label(),
                self.title
            )
        } else {
            format!(
                "\u{1F4CB} New {} Defect Reported - {}",
                self.priority_label(),
                self.title
            )
        }
    }

    pub fn html_body(&self) -> String {
        let color = self.priority_color();
        let header_text_color = if self.priority <= 2 { "#fff" } else { "#333" };
        let urgency = if self.is_urgent() {
            "<p style=\"color: #ff0000; font-weight: bold; font-size: 18px;\">\u{26A0}\u{FE0F} This defect requires your URGENT ATTENTION</p>"
        } else {
            "<p style=\"color: #666; font-size: 16px;\">This defect requires your attention.</p>"
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: {color}; color: {header_text_color}; padding: 20px; border-radius: 8px 8px 0 0; }}
    .content {{ background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; }}
    .field {{ margin: 15px 0; }}
    .label {{ font-weight: bold; color: #555; }}
    .value {{ margin-top: 5px; }}
    .footer {{ margin-top: 20px; padding-top: 20px; border-top: 1px solid #ddd; font-size: 12px; color: #666; }}
    .button {{ display: inline-block; background: #007aff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin-top: 15px; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1 style="margin: 0;">New Defect Reported</h1>
    </div>
    <div class="content">
      {urgency}
      <div class="field">
        <div class="label">Priority:</div>
        <div class="value" style="color: {color}; font-weight: bold; font-size: 18px;">{label} (Priority {priority})</div>
      </div>
      <div class="field">
        <div class="label">Asset:</div>
        <div class="value">{asset}</div>
      </div>
      <div class="field">
        <div class="label">Title:</div>
        <div class="value"><strong>{title}</strong></div>
      </div>
      <div class="field">
        <div class="label">Description:</div>
        <div class="value">{description}</div>
      </div>
      <div class="field">
        <div class="label">Category:</div>
        <div class="value">{category}</div>
      </div>
      <div class="field">
        <div class="label">Submitted By:</div>
        <div class="value">{submitted_by}</div>
      </div>
      <div class="field">
        <div class="label">Status:</div>
        <div class="value">{status}</div>
      </div>
      <a href="{portal}" class="button">View in Admin Portal</a>
      <div class="footer">
        <p>This is an automated notification from the Maintenance Portal.</p>
        <p>Defect ID: {id}</p>
      </div>
    </div>
  </div>
</body>
</html>"#,
            color = color,
            header_text_color = header_text_color,
            urgency = urgency,
            label = self.priority_label(),
            priority = self.priority,
            asset = self.asset,
            title = self.title,
            description = self.description,
            category = self.category,
            submitted_by = self.submitted_by,
            status = self.status,
            portal = PORTAL_URL,
            id = self.id,
        )
    }
}
