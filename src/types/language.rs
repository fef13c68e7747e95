//! Language identifiers.
//!
//! Two flavors exist: [`Rfc5646Language`], the closed set of officially
//! supported tags, and [`ProprietaryLanguage`], the open form learned from the
//! `available-languages` endpoint or echoed back in responses. Both reduce to
//! a what3words code plus an optional what3words locale, which is all the
//! wire protocol needs.

use serde::{Deserialize, Serialize};

/// RFC 5646 language tags supported across what3words products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rfc5646Language {
    Af,
    Am,
    Ar,
    Bg,
    Bn,
    BsLatn,
    BsCyrl,
    Ca,
    Cs,
    Cy,
    Da,
    De,
    El,
    EnAu,
    EnCa,
    EnGb,
    EnIn,
    EnUs,
    EsEs,
    EsMx,
    Et,
    Fa,
    Fi,
    FrCa,
    FrFr,
    Gu,
    He,
    Hi,
    Hr,
    Hu,
    Id,
    It,
    Ja,
    KkCyrl,
    KkLatn,
    Km,
    Kn,
    Ko,
    Lo,
    Ml,
    MnCyrl,
    MnLatn,
    Mr,
    Ms,
    Ne,
    Nl,
    No,
    Or,
    Pa,
    Pl,
    PtBr,
    PtPt,
    Ro,
    Ru,
    Si,
    Sk,
    SrLatnRs,
    SrCyrlRs,
    SrLatnMe,
    SrCyrlMe,
    Sv,
    Sw,
    Ta,
    Te,
    Tr,
    Uk,
    Ur,
    Vi,
    Xh,
    ZhHans,
    ZhHantHk,
    ZhHantTw,
    Zu,
}

impl Rfc5646Language {
    pub const ALL: [Rfc5646Language; 73] = {
        use Rfc5646Language::*;
        [
            Af, Am, Ar, Bg, Bn, BsLatn, BsCyrl, Ca, Cs, Cy, Da, De, El, EnAu, EnCa, EnGb, EnIn,
            EnUs, EsEs, EsMx, Et, Fa, Fi, FrCa, FrFr, Gu, He, Hi, Hr, Hu, Id, It, Ja, KkCyrl,
            KkLatn, Km, Kn, Ko, Lo, Ml, MnCyrl, MnLatn, Mr, Ms, Ne, Nl, No, Or, Pa, Pl, PtBr,
            PtPt, Ro, Ru, Si, Sk, SrLatnRs, SrCyrlRs, SrLatnMe, SrCyrlMe, Sv, Sw, Ta, Te, Tr, Uk,
            Ur, Vi, Xh, ZhHans, ZhHantHk, ZhHantTw, Zu,
        ]
    };

    /// The full RFC 5646 tag, e.g. `zh-Hant-TW`.
    pub fn code(&self) -> &'static str {
        use Rfc5646Language::*;
        match self {
            Af => "af",
            Am => "am",
            Ar => "ar",
            Bg => "bg",
            Bn => "bn",
            BsLatn => "bs-Latn",
            BsCyrl => "bs-Cyrl",
            Ca => "ca",
            Cs => "cs",
            Cy => "cy",
            Da => "da",
            De => "de",
            El => "el",
            EnAu => "en-AU",
            EnCa => "en-CA",
            EnGb => "en-GB",
            EnIn => "en-IN",
            EnUs => "en-US",
            EsEs => "es-ES",
            EsMx => "es-MX",
            Et => "et",
            Fa => "fa",
            Fi => "fi",
            FrCa => "fr-CA",
            FrFr => "fr-FR",
            Gu => "gu",
            He => "he",
            Hi => "hi",
            Hr => "hr",
            Hu => "hu",
            Id => "id",
            It => "it",
            Ja => "ja",
            KkCyrl => "kk-Cyrl",
            KkLatn => "kk-Latn",
            Km => "km",
            Kn => "kn",
            Ko => "ko",
            Lo => "lo",
            Ml => "ml",
            MnCyrl => "mn-Cyrl",
            MnLatn => "mn-Latn",
            Mr => "mr",
            Ms => "ms",
            Ne => "ne",
            Nl => "nl",
            No => "no",
            Or => "or",
            Pa => "pa",
            Pl => "pl",
            PtBr => "pt-BR",
            PtPt => "pt-PT",
            Ro => "ro",
            Ru => "ru",
            Si => "si",
            Sk => "sk",
            SrLatnRs => "sr-Latn-RS",
            SrCyrlRs => "sr-Cyrl-RS",
            SrLatnMe => "sr-Latn-ME",
            SrCyrlMe => "sr-Cyrl-ME",
            Sv => "sv",
            Sw => "sw",
            Ta => "ta",
            Te => "te",
            Tr => "tr",
            Uk => "uk",
            Ur => "ur",
            Vi => "vi",
            Xh => "xh",
            ZhHans => "zh-Hans",
            ZhHantHk => "zh-Hant-HK",
            ZhHantTw => "zh-Hant-TW",
            Zu => "zu",
        }
    }

    /// Case-insensitive lookup by RFC 5646 tag.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// ISO 639-1 language subtag, e.g. `zh` for `zh-Hant-TW`.
    pub fn language_code(&self) -> &'static str {
        self.code().split('-').next().unwrap_or_default()
    }

    /// ISO 15924 script subtag, e.g. `Hant` for `zh-Hant-TW`.
    pub fn script_code(&self) -> Option<&'static str> {
        self.code().split('-').nth(1).filter(|s| s.len() == 4)
    }

    /// ISO 3166-1 region subtag, e.g. `TW` for `zh-Hant-TW`.
    pub fn region_code(&self) -> Option<&'static str> {
        let parts: Vec<&'static str> = self.code().split('-').collect();
        match parts.as_slice() {
            [_, region] if region.len() == 2 => Some(*region),
            [_, _, region] if region.len() == 2 => Some(*region),
            _ => None,
        }
    }

    /// Language code used by the what3words API.
    pub fn w3w_code(&self) -> &'static str {
        self.language_code()
    }

    /// what3words locale for languages the API splits by script.
    pub fn w3w_locale(&self) -> Option<&'static str> {
        use Rfc5646Language::*;
        match self {
            KkCyrl => Some("kk_cy"),
            KkLatn => Some("kk_la"),
            MnCyrl => Some("mn_cy"),
            MnLatn => Some("mn_la"),
            ZhHans => Some("zh_si"),
            ZhHantHk => Some("zh_tr_hk"),
            ZhHantTw => Some("zh_tr_tw"),
            _ => None,
        }
    }
}

/// A language as the what3words API names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProprietaryLanguage {
    pub code: String,
    pub locale: Option<String>,
    pub name: Option<String>,
    pub native_name: Option<String>,
}

impl ProprietaryLanguage {
    pub fn new(code: impl Into<String>, locale: Option<String>) -> Self {
        Self {
            code: code.into(),
            locale,
            name: None,
            native_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rfc5646(Rfc5646Language),
    Proprietary(ProprietaryLanguage),
}

impl Language {
    pub fn w3w_code(&self) -> &str {
        match self {
            Language::Rfc5646(lang) => lang.w3w_code(),
            Language::Proprietary(lang) => &lang.code,
        }
    }

    pub fn w3w_locale(&self) -> Option<&str> {
        match self {
            Language::Rfc5646(lang) => lang.w3w_locale(),
            Language::Proprietary(lang) => lang.locale.as_deref(),
        }
    }
}

impl From<Rfc5646Language> for Language {
    fn from(lang: Rfc5646Language) -> Self {
        Language::Rfc5646(lang)
    }
}

impl From<ProprietaryLanguage> for Language {
    fn from(lang: ProprietaryLanguage) -> Self {
        Language::Proprietary(lang)
    }
}
