//! Static display names for supported currency codes.

/// Language family used for display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleFamily {
    Russian,
    English,
}

impl LocaleFamily {
    /// Rates quoted against the ruble are shown with Russian names.
    pub fn for_base(base_currency: &str) -> Self {
        if base_currency.eq_ignore_ascii_case("RUB") {
            LocaleFamily::Russian
        } else {
            LocaleFamily::English
        }
    }
}

const RUSSIAN_NAMES: &[(&str, &str)] = &[
    ("RUB", "Российский рубль"),
    ("USD", "Доллар США"),
    ("EUR", "Евро"),
    ("JPY", "Японская йена"),
    ("CNY", "Китайский юань"),
    ("INR", "Индийская рупия"),
    ("HUF", "Венгерский форинт"),
    ("PLN", "Польский злотый"),
    ("RON", "Румынский лей"),
    ("TRY", "Турецкая лира"),
    ("CAD", "Канадский доллар"),
    ("ILS", "Израильский новый шекель"),
    ("KRW", "Южнокорейская вона"),
    ("SGD", "Сингапурский доллар"),
    ("BGN", "Болгарский лев"),
    ("CZK", "Чешская крона"),
    ("DKK", "Датская крона"),
    ("GBP", "Британский фунт стерлингов"),
    ("SEK", "Шведская крона"),
    ("CHF", "Швейцарский франк"),
    ("ISK", "Исландская крона"),
    ("NOK", "Норвежская крона"),
    ("HRK", "Хорватская куна"),
    ("AUD", "Австралийский доллар"),
    ("BRL", "Бразильский реал"),
    ("HKD", "Гонконгский доллар"),
    ("IDR", "Индонезийская рупия"),
    ("MXN", "Мексиканское песо"),
    ("MYR", "Малайзийский ринггит"),
    ("NZD", "Новозеландский доллар"),
    ("PHP", "Филиппинское песо"),
    ("THB", "Тайский бат"),
    ("ZAR", "Южноафриканский рэнд"),
];

const ENGLISH_NAMES: &[(&str, &str)] = &[
    ("RUB", "Russian Ruble"),
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("JPY", "Japanese Yen"),
    ("CNY", "Chinese Yuan"),
    ("INR", "Indian Rupee"),
    ("HUF", "Hungarian Forint"),
    ("PLN", "Polish Zloty"),
    ("RON", "Romanian Leu"),
    ("TRY", "Turkish Lira"),
    ("CAD", "Canadian Dollar"),
    ("ILS", "Israeli New Shekel"),
    ("KRW", "South Korean Won"),
    ("SGD", "Singapore Dollar"),
    ("BGN", "Bulgarian Lev"),
    ("CZK", "Czech Koruna"),
    ("DKK", "Danish Krone"),
    ("GBP", "British Pound Sterling"),
    ("SEK", "Swedish Krona"),
    ("CHF", "Swiss Franc"),
    ("ISK", "Icelandic Krona"),
    ("NOK", "Norwegian Krone"),
    ("HRK", "Croatian Kuna"),
    ("AUD", "Australian Dollar"),
    ("BRL", "Brazilian Real"),
    ("HKD", "Hong Kong Dollar"),
    ("IDR", "Indonesian Rupiah"),
    ("MXN", "Mexican Peso"),
    ("MYR", "Malaysian Ringgit"),
    ("NZD", "New Zealand Dollar"),
    ("PHP", "Philippine Peso"),
    ("THB", "Thai Baht"),
    ("ZAR", "South African Rand"),
];

/// Display name for `code`, falling back to the code itself.
pub fn currency_name(code: &str, locale: LocaleFamily) -> String {
    let table = match locale {
        LocaleFamily::Russian => RUSSIAN_NAMES,
        LocaleFamily::English => ENGLISH_NAMES,
    };
    table
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}
