// Integration tests for the bundled prompt catalogue
// WHY: the shipped data file must stay parseable and every template must render

use mistype::parsers::OutputParser;
use mistype::prompts::{build_request, parse_vars, Catalogue, ChatResponse};
use mistype::{AppConfig, Normalizer};
use std::collections::BTreeMap;

const CATALOGUE_PATH: &str = "data/prompts.toml";

fn sample_value(name: &str) -> String {
    match name {
        "year_group" => "Year 8".to_string(),
        "duration" => "50".to_string(),
        "count" => "5".to_string(),
        other => format!("<{other}>"),
    }
}

#[tokio::test]
async fn test_bundled_catalogue_renders_every_task() {
    let catalogue = Catalogue::load(CATALOGUE_PATH).await.expect("Bundled catalogue should load");
    assert!(catalogue.version >= 1);
    assert!(catalogue.tasks().count() >= 8);

    for task in catalogue.tasks() {
        let template = catalogue.get(task).unwrap();
        let vars: BTreeMap<String, String> = template
            .placeholders()
            .unwrap()
            .into_iter()
            .map(|name| {
                let value = sample_value(&name);
                (name, value)
            })
            .collect();

        let rendered = template.render(&vars).unwrap_or_else(|e| panic!("{task}: {e:#}"));
        assert!(!rendered.contains('{') || task == "Convert to MCQ", "{task} left a brace: {rendered}");
    }
}

#[tokio::test]
async fn test_plan_and_print_request() {
    let catalogue = Catalogue::load(CATALOGUE_PATH).await.unwrap();
    let normalizer = Normalizer::with_defaults().unwrap();
    let vars = parse_vars(&["year_group=Year 7", "duration=60"]).unwrap();

    let request = build_request(
        &catalogue,
        "Plan & Print",
        &vars,
        "The wa,ter cycle: see 'evap.oration' notes in /shared/sci.ence\n",
        &normalizer,
    )
    .unwrap();

    let system = &request.messages[0].content;
    assert!(system.contains("Year Group: Year 7"));
    assert!(system.contains("Lesson Duration: 60 minutes"));
    assert_eq!(
        request.messages[1].content,
        "The water cycle: see 'evaporation' notes in /shared/sci.ence"
    );
}

#[tokio::test]
async fn test_mcq_escaped_braces_and_missing_vars() {
    let catalogue = Catalogue::load(CATALOGUE_PATH).await.unwrap();
    let mcq = catalogue.get("Convert to MCQ").unwrap();

    assert_eq!(mcq.placeholders().unwrap(), vec!["count", "year_group"]);
    let rendered = mcq
        .render(&parse_vars(&["count=3", "year_group=Year 10"]).unwrap())
        .unwrap();
    assert!(rendered.contains("{Answer: X}"));

    assert!(mcq.render(&parse_vars(&["count=3"]).unwrap()).is_err());
}

#[tokio::test]
async fn test_config_points_at_catalogue() {
    let config = AppConfig::from_toml_str("catalogue = \"data/prompts.toml\"").unwrap();
    let path = config.catalogue.expect("catalogue path set");
    let catalogue = Catalogue::load(&path).await.unwrap();
    assert!(catalogue.get("Generate Flashcards").is_ok());
    assert!(catalogue.get("Unknown Task").is_err());
}

#[tokio::test]
async fn test_reflection_sheet_round_trip() {
    let catalogue = Catalogue::load(CATALOGUE_PATH).await.unwrap();
    let normalizer = Normalizer::with_defaults().unwrap();
    let request = build_request(
        &catalogue,
        "Behaviour Reflection Sheet",
        &parse_vars::<&str>(&[]).unwrap(),
        "Year 4 stu,dent, playground conflict",
        &normalizer,
    )
    .unwrap();
    assert!(request.messages[0].content.contains("Calming Strategies:"));
    assert_eq!(request.messages[1].content, "Year 4 student, playground conflict");

    let body = serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "1. What happened?\n2. Who was hurt?\n\nCalming Strategies:\n[ ] Deep breaths\n[ ] Walk to the quiet corner\n"
            }
        }]
    })
    .to_string();
    let response = ChatResponse::from_json(&body).unwrap();
    let sheet = OutputParser::new().unwrap().parse_reflection_sheet(response.content().unwrap());

    assert_eq!(sheet.questions, vec!["What happened?", "Who was hurt?"]);
    assert_eq!(sheet.strategies, vec!["Deep breaths", "Walk to the quiet corner"]);
}

#[tokio::test]
async fn test_literacy_activity_template_labels_match_parser() {
    let catalogue = Catalogue::load(CATALOGUE_PATH).await.unwrap();
    let template = catalogue.get("Functional Literacy Activity").unwrap();
    let system = template.render(&parse_vars::<&str>(&[]).unwrap()).unwrap();

    // the template's own example layout must parse
    let activity = OutputParser::new().unwrap().parse_literacy_activity(&system);
    assert_eq!(
        activity.task_instruction.as_deref(),
        Some("One clear sentence explaining the task.")
    );
    assert!(activity.support_prompt.unwrap().starts_with("One sentence stem"));
}
