//! Routing properties over realistic user messages.

use governance_assistant::{select_agent, AgentChoice, AgentKind};

#[test]
fn test_realistic_messages() {
    let cases = [
        ("Fais-moi une synthèse du rapport annuel", AgentKind::Summary),
        ("Quels sont nos risques au regard de l'AI Act ?", AgentKind::Compliance),
        ("Comment mettre en place un data mesh ?", AgentKind::Governance),
        ("Rédige un email au COMEX", AgentKind::Deliverable),
        ("Qui valide les accès aux données clients ?", AgentKind::Knowledge),
    ];
    for (text, expected) in cases {
        assert_eq!(select_agent(text, AgentChoice::Auto), expected, "{}", text);
    }
}

#[test]
fn test_two_category_inputs_follow_priority() {
    let pairs = [
        ("summary of the security review", AgentKind::Summary),
        ("risque lié au lineage", AgentKind::Compliance),
        ("architecture cible et plan de migration", AgentKind::Governance),
    ];
    for (text, expected) in pairs {
        assert_eq!(select_agent(text, AgentChoice::Auto), expected, "{}", text);
    }
}

#[test]
fn test_manual_choice_ignores_text() {
    let choice: AgentChoice = "compliance".parse().unwrap();
    assert_eq!(select_agent("tl;dr", choice), AgentKind::Compliance);
    assert_eq!(select_agent("", AgentChoice::Manual(AgentKind::Governance)), AgentKind::Governance);
}
