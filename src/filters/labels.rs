/// Known translations of panel labels, keyed by the English label.
const ALIASES: &[(&str, &[&str])] = &[
    ("Most recent", &["Mas recientes", "Más recientes", "Recientes"]),
    ("Most relevant", &["Mas relevantes", "Más relevantes", "Relevantes"]),
    ("Any time", &["En cualquier momento", "Cualquier momento"]),
    ("Past month", &["Ultimo mes", "Último mes", "Mes pasado"]),
    ("Past week", &["Ultima semana", "Última semana", "Semana pasada"]),
    ("Past 24 hours", &["Ultimas 24 horas", "Últimas 24 horas"]),
    ("Easy Apply", &["Solicitud sencilla", "Solicitud simplificada"]),
    ("Under 10 applicants", &["Menos de 10 solicitantes"]),
    ("In your network", &["En tu red"]),
    ("Fair Chance Employer", &["Empresa con oportunidad justa"]),
    ("On-site", &["Presencial"]),
    ("Remote", &["En remoto", "Remoto"]),
    ("Hybrid", &["Híbrido", "Hibrido"]),
    ("Internship", &["Prácticas", "Pasantía", "Becario"]),
    ("Entry level", &["Nivel inicial"]),
    ("Associate", &["Asociado"]),
    ("Mid-Senior level", &["Intermedio", "Senior"]),
    ("Director", &["Director"]),
    ("Executive", &["Ejecutivo"]),
    ("Full-time", &["Tiempo completo"]),
    ("Part-time", &["Tiempo parcial"]),
    ("Contract", &["Contrato"]),
    ("Temporary", &["Temporal"]),
    ("Volunteer", &["Voluntariado"]),
    ("Other", &["Otro"]),
];

pub fn candidates(label: &str) -> Vec<String> {
    let mut out = vec![label.to_string()];
    let aliases = ALIASES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(label.trim()))
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[]);
    for alias in aliases {
        if !out.iter().any(|seen| seen == alias) {
            out.push(alias.to_string());
        }
    }
    out
}

pub fn normalized_candidates(label: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for candidate in candidates(label) {
        let norm = normalize(&candidate);
        if !norm.is_empty() && !out.contains(&norm) {
            out.push(norm);
        }
    }
    out
}

/// Lowercase, strip diacritics, unify dashes and spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00a0}' | '\u{2007}' | '\u{202f}' => folded.push(' '),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => folded.push('-'),
            // Combining marks left over from decomposed input
            '\u{0300}'..='\u{036f}' => {}
            _ => {
                for lower in ch.to_lowercase() {
                    folded.push(fold_diacritic(lower));
                }
            }
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'ī' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ø' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' => 'u',
        'ñ' | 'ń' => 'n',
        'ç' | 'ć' | 'č' => 'c',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ł' => 'l',
        _ => ch,
    }
}

/// Exact normalized equality, then containment of a label in a probe.
pub fn matches(labels: &[String], probes: &[String]) -> Option<MatchKind> {
    if labels.iter().any(|l| probes.iter().any(|p| p == l)) {
        return Some(MatchKind::Exact);
    }
    if labels.iter().any(|l| probes.iter().any(|p| p.contains(l.as_str()))) {
        return Some(MatchKind::Contains);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Contains,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        accents = { "Más recientes", "mas recientes" },
        nbsp = { "Past\u{00a0}24\u{00a0}hours", "past 24 hours" },
        dashes = { "Mid\u{2013}Senior level", "mid-senior level" },
        spaces = { "  Under   10\n applicants ", "under 10 applicants" },
        decomposed = { "Hi\u{0301}brido", "hibrido" },
        enye = { "Compañía", "compania" },
    )]
    fn test_normalize(input: &str, expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_candidates_include_aliases() {
        let c = candidates("Remote");
        assert_eq!(c, vec!["Remote", "En remoto", "Remoto"]);
        assert_eq!(candidates("Acme Corp"), vec!["Acme Corp"]);
    }

    #[test]
    fn test_normalized_candidates_dedup() {
        // "Director" aliases to itself
        assert_eq!(normalized_candidates("Director"), vec!["director"]);
        assert_eq!(
            normalized_candidates("Hybrid"),
            vec!["hybrid", "hibrido"]
        );
    }

    #[test]
    fn test_matches_prefers_exact() {
        let labels = normalized_candidates("Past week");
        assert_eq!(matches(&labels, &["ultima semana".to_string()]), Some(MatchKind::Exact));
        assert_eq!(
            matches(&labels, &["past week (1,024 results)".to_string()]),
            Some(MatchKind::Contains)
        );
        assert_eq!(matches(&labels, &["past month".to_string()]), None);
    }
}
