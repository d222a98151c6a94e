//! 프로젝트 수명 주기와 저장소 일관성 통합 테스트.

use freelance_core::domain::{
    average_rating, Account, AccountChange, AccountId, AccountUpdate, NewAccount, NewProject,
    Project, ProjectFilter, ProjectStatus, Review, Role,
};
use freelance_core::store::{AccountStore, MemoryStore, ProjectStore, ReviewStore};
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn new_account(email: &str, role: Role, skills: &[&str]) -> Account {
    Account::new(NewAccount {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role,
        name: email.to_string(),
        business_name: None,
        business_type: None,
        skills: Some(skills.iter().map(|s| s.to_string()).collect()),
    })
}

#[tokio::test]
async fn test_project_from_posting_to_review() {
    let store = MemoryStore::new();
    let client = store
        .insert_account(new_account("lara@example.com", Role::Client, &[]))
        .await
        .unwrap();
    let freelancer = store
        .insert_account(new_account(
            "alice@example.com",
            Role::Freelancer,
            &["Web Security"],
        ))
        .await
        .unwrap();

    let mut project = Project::new(
        client.id.clone(),
        NewProject {
            title: "Web app audit".to_string(),
            description: "OWASP top 10 review".to_string(),
            skills_required: vec!["web security".to_string()],
            budget: Some(dec!(1500)),
            deadline: None,
        },
    )
    .unwrap();
    project.register_interest(&freelancer.id).unwrap();
    let project = store.insert_project(project).await.unwrap();

    // 기술이 겹치는 프리랜서에게 보이는 프로젝트
    let visible = store
        .list_projects(
            &ProjectFilter::default()
                .with_status(ProjectStatus::Open)
                .with_skills(freelancer.skills.clone()),
        )
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].interested.len(), 1);

    let mut project = store.find_project(project.id).await.unwrap().unwrap();
    project.assign(freelancer.id.clone()).unwrap();
    project.transition(ProjectStatus::InProgress).unwrap();
    project.transition(ProjectStatus::Completed).unwrap();
    store.update_project(project.clone()).await.unwrap();

    let assigned = store
        .list_projects(&ProjectFilter::for_freelancer(freelancer.id.clone()))
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].status, ProjectStatus::Completed);

    for rating in [5, 4] {
        store
            .insert_review(Review::new(client.id.clone(), freelancer.id.clone(), rating, "great").unwrap())
            .await
            .unwrap();
    }
    let reviews = store.reviews_for_freelancer(&freelancer.id).await.unwrap();
    assert!((average_rating(&reviews) - 4.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_role_change_is_read_back_immediately() {
    let store = MemoryStore::new();
    let mut account = new_account("bob@example.com", Role::Freelancer, &[]);
    account.id = AccountId::new("u1");
    store.insert_account(account.clone()).await.unwrap();

    let demote = AccountChange::Admin(AccountUpdate {
        role: Some(Role::Client),
        ..Default::default()
    });
    store.modify_account(&account.id, demote).await.unwrap();

    let loaded = store
        .find_account(&AccountId::new("u1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.role, Role::Client);
}

fn any_status() -> impl Strategy<Value = ProjectStatus> {
    prop_oneof![
        Just(ProjectStatus::Open),
        Just(ProjectStatus::Assigned),
        Just(ProjectStatus::InProgress),
        Just(ProjectStatus::Completed),
        Just(ProjectStatus::Closed),
    ]
}

proptest! {
    #[test]
    fn terminal_statuses_never_move(from in any_status(), to in any_status()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
        // 역방향(open으로 복귀)은 허용되지 않음
        prop_assert!(!from.can_transition_to(ProjectStatus::Open));
    }

    #[test]
    fn status_tags_parse_back(status in any_status()) {
        prop_assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
    }
}
