//! Statically authored list definitions shipped with the portal.
//!
//! `system_lists` backs forms and back-office screens; `autocomplete_lists`
//! backs suggestion inputs. Deployments can also supply definitions as a JSON
//! array (see [`load_definitions`]).

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{ListDefinition, ListOption, ListTarget};

/// Built-in definitions for a target
pub fn definitions_for(target: ListTarget) -> Vec<ListDefinition> {
    match target {
        ListTarget::System => system_lists(),
        ListTarget::Autocomplete => autocomplete_lists(),
    }
}

/// Reference lists used by forms and the back-office
pub fn system_lists() -> Vec<ListDefinition> {
    vec![
        list(
            "languages",
            "Langues",
            &[
                ("ar", "Arabe"),
                ("ber", "Amazighe"),
                ("fr", "Français"),
                ("en", "Anglais"),
                ("es", "Espagnol"),
                ("he", "Hébreu"),
                ("la", "Latin"),
            ],
        ),
        list(
            "countries",
            "Pays",
            &[
                ("ma", "Maroc"),
                ("dz", "Algérie"),
                ("tn", "Tunisie"),
                ("fr", "France"),
                ("es", "Espagne"),
                ("eg", "Égypte"),
            ],
        ),
        list(
            "formats",
            "Formats",
            &[
                ("print", "Imprimé"),
                ("ebook", "Livre numérique"),
                ("audio", "Document sonore"),
                ("microfilm", "Microfilm"),
                ("digitized", "Document numérisé"),
            ],
        ),
        list(
            "document_types",
            "Types de document",
            &[
                ("book", "Monographie"),
                ("periodical", "Périodique"),
                ("manuscript", "Manuscrit"),
                ("map", "Carte"),
                ("thesis", "Thèse"),
                ("score", "Partition"),
            ],
        ),
        list(
            "deposit_statuses",
            "Statuts du dépôt légal",
            &[
                ("draft", "Brouillon"),
                ("submitted", "Soumis"),
                ("under_review", "En cours d'examen"),
                ("approved", "Validé"),
                ("rejected", "Rejeté"),
                ("attributed", "Numéro attribué"),
            ],
        ),
        list(
            "activity_categories",
            "Catégories d'activités culturelles",
            &[
                ("exhibition", "Exposition"),
                ("conference", "Conférence"),
                ("workshop", "Atelier"),
                ("screening", "Projection"),
                ("concert", "Concert"),
            ],
        ),
        list(
            "manuscript_subjects",
            "Sujets des manuscrits",
            &[
                ("religious", "Sciences religieuses"),
                ("literature", "Littérature"),
                ("sciences", "Sciences"),
            ],
        )
        .with(ListOption::new("fiqh", "Jurisprudence", 4).with_parent("religious"))
        .with(ListOption::new("hadith", "Hadith", 5).with_parent("religious"))
        .with(ListOption::new("poetry", "Poésie", 6).with_parent("literature"))
        .with(ListOption::new("astronomy", "Astronomie", 7).with_parent("sciences"))
        .with(ListOption::new("medicine", "Médecine", 8).with_parent("sciences")),
    ]
}

/// Suggestion lists backing autocomplete inputs
pub fn autocomplete_lists() -> Vec<ListDefinition> {
    vec![
        list(
            "author_roles",
            "Rôles des contributeurs",
            &[
                ("author", "Auteur"),
                ("editor", "Éditeur scientifique"),
                ("translator", "Traducteur"),
                ("illustrator", "Illustrateur"),
                ("preface", "Préfacier"),
            ],
        ),
        list(
            "publication_frequencies",
            "Périodicités",
            &[
                ("daily", "Quotidien"),
                ("weekly", "Hebdomadaire"),
                ("monthly", "Mensuel"),
                ("quarterly", "Trimestriel"),
                ("yearly", "Annuel"),
            ],
        ),
        list(
            "publisher_types",
            "Types d'éditeurs",
            &[
                ("commercial", "Éditeur commercial"),
                ("institutional", "Éditeur institutionnel"),
                ("self", "Auto-édition"),
                ("academic", "Presses universitaires"),
            ],
        ),
        list(
            "scripts",
            "Écritures",
            &[
                ("arabic", "Arabe"),
                ("maghribi", "Maghribi"),
                ("tifinagh", "Tifinagh"),
                ("latin", "Latine"),
                ("hebrew", "Hébraïque"),
            ],
        ),
    ]
}

/// Parse definitions from a JSON array
pub fn parse_definitions(raw: &str) -> Result<Vec<ListDefinition>> {
    Ok(serde_json::from_str(raw)?)
}

/// Read definitions from a JSON file
pub fn load_definitions(path: &Path) -> Result<Vec<ListDefinition>> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        Error::InvalidInput(format!(
            "Failed to read definitions at {}: {}",
            path.display(),
            error
        ))
    })?;
    parse_definitions(&raw)
}

fn list(code: &str, name: &str, options: &[(&str, &str)]) -> ListDefinition {
    options
        .iter()
        .fold(ListDefinition::new(code, name), |definition, (code, label)| {
            definition.with_option(*code, *label)
        })
}
