//! Key Normalizer Module
//!
//! 商品名などのキーを近似一致のために正規化し、編集距離を計算するモジュール。

use std::sync::OnceLock;

use regex::Regex;

/// 除去する引用符
const QUOTES: [char; 7] = ['"', '\'', '«', '»', '“', '”', '„'];

/// 固定の書き換え表（空白正規化後の文字列に適用）
const REWRITES: [(&str, &str); 2] = [("ніжність", "ніжн"), ("інтенс зволоження", "інтенсзволож")];

fn packaging_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"500\s*г\s+з\s+розпилювачем").expect("invalid packaging regex")
    })
}

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*(мл|ml|г|g|л|l|шт|pcs)\b").expect("invalid unit regex")
    })
}

fn brand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nivea\s+creme").expect("invalid brand regex"))
}

/// 文字列を近似一致用に正規化する
///
/// 1. 小文字化し、`_`を空白に置換
/// 2. `,` `.` と引用符を除去
/// 3. 連続する空白を1つにまとめ、前後の空白を除去
/// 4. 固定の書き換え（語の短縮、包装単位の表記ゆれ）
/// 5. 単位を`<数値><単位>`の形に詰める（`100 мл` → `100мл`）
/// 6. ブランド名の連結（`nivea creme` → `niveacreme`）
///
/// 正規化は冪等です: `normalize(&normalize(s)) == normalize(s)`
///
/// # 使用例
///
/// ```rust
/// use sverka::normalize;
///
/// assert_eq!(normalize("Крем Nivea Creme 100 мл"), "крем niveacreme 100мл");
/// assert_eq!(normalize("Гель_для душу, 250ml."), "гель для душу 250ml");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ',' | '.') && !QUOTES.contains(c))
        .map(|c| if c == '_' { ' ' } else { c })
        .collect();

    let mut normalized = collapse_whitespace(&lowered);

    // 書き換えの結果が再び書き換え対象になり得るため、変化がなくなるまで繰り返す
    loop {
        let rewritten = rewrite(&normalized);
        if rewritten == normalized {
            return normalized;
        }
        normalized = rewritten;
    }
}

/// 書き換え表・包装・単位・ブランド名の書き換えを1回適用する
fn rewrite(text: &str) -> String {
    let mut rewritten = text.to_string();
    for (from, to) in REWRITES {
        if rewritten.contains(from) {
            rewritten = rewritten.replace(from, to);
        }
    }
    rewritten = packaging_re()
        .replace_all(&rewritten, "500мл з розпилювачем")
        .into_owned();
    rewritten = unit_re().replace_all(&rewritten, "$1$2").into_owned();
    rewritten = brand_re().replace_all(&rewritten, "niveacreme").into_owned();

    // 書き換えで生じた空白の重複を除去
    collapse_whitespace(&rewritten)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 2つの文字列の編集距離（レーベンシュタイン距離）
///
/// 挿入・削除・置換のコストはいずれも1。文字（`char`）単位で計算します。
///
/// # 使用例
///
/// ```rust
/// use sverka::edit_distance;
///
/// assert_eq!(edit_distance("kitten", "sitting"), 3);
/// assert_eq!(edit_distance("", "мл"), 2);
/// ```
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_case_and_punctuation() {
        assert_eq!(normalize("  КРЕМ,  «Ніжність». "), "крем ніжн");
        assert_eq!(normalize("a_b__c"), "a b c");
        assert_eq!(normalize("\"Quoted\""), "quoted");
    }

    #[test]
    fn test_unit_folding() {
        assert_eq!(normalize("Шампунь 400 мл"), "шампунь 400мл");
        assert_eq!(normalize("Mask 2 PCS"), "mask 2pcs");
        assert_eq!(normalize("Сіль 1 л"), "сіль 1л");
        // 数値を伴わない単位はそのまま
        assert_eq!(normalize("мл"), "мл");
    }

    #[test]
    fn test_domain_rewrites() {
        assert_eq!(
            normalize("Спрей 500 г з розпилювачем"),
            "спрей 500мл з розпилювачем"
        );
        assert_eq!(normalize("Спрей 500мл з розпилювачем"), "спрей 500мл з розпилювачем");
        assert_eq!(normalize("Крем Інтенс зволоження"), "крем інтенсзволож");
        assert_eq!(normalize("NIVEA   Creme 150ml"), "niveacreme 150ml");
    }

    #[test]
    fn test_rewrite_output_rewritten_again() {
        let once = normalize("Крем ніжністьість");
        assert_eq!(once, "крем ніжн");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_product_names_converge() {
        let a = normalize("Крем Nivea Creme 100мл");
        let b = normalize("крем nivea creme 100 мл");
        assert_eq!(a, b);
        assert!(edit_distance(&a, &b) <= 2);
    }

    #[test]
    fn test_edit_distance_known_values() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("крем", "крем"), 0);
        assert_eq!(edit_distance("крем", "кремы"), 1);
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "\\PC{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_idempotent_product_like(
            s in "[а-яА-Яa-zA-Z0-9 _,.\"«»]{0,30}( ?(мл|ml|г|g|л|l|шт|pcs))?"
        ) {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_idempotent_rewrite_words(
            parts in prop::collection::vec(
                prop::sample::select(vec![
                    "ніжн", "ість", "ніжність", "інтенс", "зволоження", "nivea", "creme",
                    "500", "г", "з", "розпилювачем", "100", "мл", " ",
                ]),
                0..10,
            )
        ) {
            let s = parts.concat();
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_edit_distance_identity(s in "\\PC{0,20}") {
            prop_assert_eq!(edit_distance(&s, &s), 0);
        }

        #[test]
        fn prop_edit_distance_symmetric(a in "\\PC{0,15}", b in "\\PC{0,15}") {
            prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
        }

        #[test]
        fn prop_edit_distance_from_empty(s in "\\PC{0,20}") {
            prop_assert_eq!(edit_distance("", &s), s.chars().count());
        }
    }
}
