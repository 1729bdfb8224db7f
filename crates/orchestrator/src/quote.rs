//! Quote arithmetic and rendering.

/// Prices applied per protected unit (pivot or pump house).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub unit_price: f64,
    pub install_price: f64,
    pub monthly_fee: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            unit_price: 11_900.0,
            install_price: 2_500.0,
            monthly_fee: 150.0,
        }
    }
}

/// A computed quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub pivots: u32,
    pub pumps: u32,
    pub equipment_total: f64,
    pub installation_total: f64,
    /// Equipment plus installation.
    pub total: f64,
    /// Monitoring fee for every unit, per month.
    pub monthly_total: f64,
    pub monthly_fee: f64,
}

/// `total = (pivots + pumps) * (unit_price + install_price)`.
pub fn generate_quote(pivots: u32, pumps: u32, pricing: &Pricing) -> Quote {
    let units = f64::from(pivots) + f64::from(pumps);
    let equipment_total = units * pricing.unit_price;
    let installation_total = units * pricing.install_price;

    Quote {
        pivots,
        pumps,
        equipment_total,
        installation_total,
        total: equipment_total + installation_total,
        monthly_total: units * pricing.monthly_fee,
        monthly_fee: pricing.monthly_fee,
    }
}

impl Quote {
    pub fn units(&self) -> u64 {
        u64::from(self.pivots) + u64::from(self.pumps)
    }

    pub fn is_empty(&self) -> bool {
        self.units() == 0
    }

    /// Customer-facing breakdown.
    pub fn render(&self, name: &str) -> String {
        let mut items = Vec::new();
        if self.pivots > 0 {
            items.push(format!("{} pivot(s)", self.pivots));
        }
        if self.pumps > 0 {
            items.push(format!("{} pump house(s)", self.pumps));
        }
        let greeting = if name.trim().is_empty() {
            "Here is".to_string()
        } else {
            format!("{}, here is", name.trim())
        };

        format!(
            "{} the quote to protect your {}:\n\n\
             Anti-theft system: {} ({} units)\n\
             Professional installation: {}\n\
             Total up front: {}\n\n\
             24h monitoring: {} per unit per month ({} per month in total).",
            greeting,
            items.join(" and "),
            format_money(self.equipment_total),
            self.units(),
            format_money(self.installation_total),
            format_money(self.total),
            format_money(self.monthly_fee),
            format_money(self.monthly_total),
        )
    }
}

/// Format an amount as `R$ 1,234.56`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}R$ {}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_arithmetic() {
        let pricing = Pricing {
            unit_price: 100.0,
            install_price: 20.0,
            monthly_fee: 5.0,
        };

        for (p, b) in [(0, 0), (1, 0), (0, 1), (2, 3), (10, 7)] {
            let quote = generate_quote(p, b, &pricing);
            assert_eq!(quote.total, f64::from(p + b) * (100.0 + 20.0));
        }

        let quote = generate_quote(2, 1, &pricing);
        assert_eq!(quote.equipment_total, 300.0);
        assert_eq!(quote.installation_total, 60.0);
        assert_eq!(quote.monthly_total, 15.0);
    }

    #[test]
    fn test_zero_quote() {
        let quote = generate_quote(0, 0, &Pricing::default());
        assert_eq!(quote.total, 0.0);
        assert!(quote.is_empty());
    }

    #[test]
    fn test_units_past_u32() {
        let quote = generate_quote(u32::MAX, u32::MAX, &Pricing::default());
        assert_eq!(quote.units(), 2 * u64::from(u32::MAX));
        assert!(!quote.is_empty());
        assert!(quote.total > 0.0);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "R$ 0.00");
        assert_eq!(format_money(150.0), "R$ 150.00");
        assert_eq!(format_money(14_400.0), "R$ 14,400.00");
        assert_eq!(format_money(1_234_567.891), "R$ 1,234,567.89");
    }

    #[test]
    fn test_render_mentions_items_and_total() {
        let text = generate_quote(2, 1, &Pricing::default()).render("Ana");
        assert!(text.starts_with("Ana, here is"));
        assert!(text.contains("2 pivot(s) and 1 pump house(s)"));
        assert!(text.contains("R$ 43,200.00"));
    }
}
