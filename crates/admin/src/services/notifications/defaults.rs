//! Built-in template content, used for seeding and for template metadata.

use chrono::{DateTime, Utc};

use kinniku_core::TemplateType;

use crate::models::EmailTemplate;

/// Built-in content for one template type.
#[derive(Debug)]
pub struct DefaultTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub subject: &'static str,
    pub body: &'static str,
    pub variables: &'static [&'static str],
}

const ORDER_VARIABLES: &[&str] = &[
    "customer_name",
    "order_number",
    "order_date",
    "order_items",
    "subtotal",
    "tax",
    "shipping",
    "total",
    "shipping_address",
];

const ORDER_COMPLETE_CREDIT: DefaultTemplate = DefaultTemplate {
    name: "注文完了メール（クレジットカード）",
    description: "クレジットカード決済の完了後に送信されます",
    subject: "【筋肉ショップ】ご注文ありがとうございます（注文番号: {{order_number}}）",
    body: include_str!("../../../notification_defaults/order_complete_credit.txt"),
    variables: ORDER_VARIABLES,
};

const ORDER_COMPLETE_BANK: DefaultTemplate = DefaultTemplate {
    name: "注文完了メール（銀行振込）",
    description: "銀行振込を選択した注文に振込先情報とともに送信されます",
    subject: "【筋肉ショップ】ご注文ありがとうございます・お振込のお願い（注文番号: {{order_number}}）",
    body: include_str!("../../../notification_defaults/order_complete_bank.txt"),
    variables: &[
        "customer_name",
        "order_number",
        "order_date",
        "order_items",
        "subtotal",
        "tax",
        "shipping",
        "total",
        "shipping_address",
        "bank_name",
        "branch_name",
        "account_type",
        "account_number",
        "account_holder",
        "payment_deadline",
    ],
};

const PAYMENT_CONFIRMED: DefaultTemplate = DefaultTemplate {
    name: "振込確認メール",
    description: "銀行振込の入金確認後に送信されます",
    subject: "【筋肉ショップ】ご入金を確認いたしました（注文番号: {{order_number}}）",
    body: include_str!("../../../notification_defaults/payment_confirmed.txt"),
    variables: &[
        "customer_name",
        "order_number",
        "payment_date",
        "total",
        "estimated_shipping_date",
    ],
};

const SHIPPING_COMPLETE: DefaultTemplate = DefaultTemplate {
    name: "発送完了メール",
    description: "商品の発送時に追跡番号とともに送信されます",
    subject: "【筋肉ショップ】商品を発送いたしました（注文番号: {{order_number}}）",
    body: include_str!("../../../notification_defaults/shipping_complete.txt"),
    variables: &[
        "customer_name",
        "order_number",
        "shipping_date",
        "carrier",
        "tracking_number",
        "tracking_url",
        "shipping_address",
    ],
};

/// Built-in content for a template type.
#[must_use]
pub const fn default_for(template_type: TemplateType) -> &'static DefaultTemplate {
    match template_type {
        TemplateType::OrderCompleteCredit => &ORDER_COMPLETE_CREDIT,
        TemplateType::OrderCompleteBank => &ORDER_COMPLETE_BANK,
        TemplateType::PaymentConfirmed => &PAYMENT_CONFIRMED,
        TemplateType::ShippingComplete => &SHIPPING_COMPLETE,
    }
}

impl DefaultTemplate {
    /// Declared variable names as owned strings.
    #[must_use]
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| (*v).to_string()).collect()
    }

    /// A fresh template with this content, stamped `now`.
    #[must_use]
    pub fn to_template(&self, template_type: TemplateType, now: DateTime<Utc>) -> EmailTemplate {
        EmailTemplate {
            template_type,
            name: self.name.to_string(),
            description: self.description.to_string(),
            subject: self.subject.to_string(),
            body: self.body.to_string(),
            variables: self.variable_names(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_variable_appears_in_template() {
        for template_type in TemplateType::ALL {
            let default = default_for(template_type);
            for name in default.variables {
                let token = format!("{{{{{name}}}}}");
                assert!(
                    default.body.contains(&token) || default.subject.contains(&token),
                    "{template_type}: {name} is declared but unused"
                );
            }
        }
    }

    #[test]
    fn test_subjects_carry_order_number() {
        for template_type in TemplateType::ALL {
            assert!(default_for(template_type).subject.contains("{{order_number}}"));
        }
    }
}
