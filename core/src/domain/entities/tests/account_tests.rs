use crate::domain::entities::{Account, TargetType};

#[test]
fn test_new_account_is_inactive() {
    let account = Account::new(TargetType::Customer, "Jamie Rivera").with_phone("+15551234567");

    assert!(!account.is_active);
    assert_eq!(account.kind, TargetType::Customer);
    assert_eq!(account.phone.as_deref(), Some("+15551234567"));
    assert!(account.email.is_none());
}

#[test]
fn test_activate() {
    let mut account = Account::new(TargetType::Trainer, "Sam Okafor");
    let before = account.updated_at;

    account.activate();
    assert!(account.is_active);
    assert!(account.updated_at >= before);
}

#[test]
fn test_has_contact() {
    let account = Account::new(TargetType::GymOwner, "Alex Chen")
        .with_email("Alex@IronHouse.fit")
        .with_phone("+442071234567");

    assert!(account.has_contact("alex@ironhouse.fit"));
    assert!(account.has_contact("+442071234567"));
    assert!(!account.has_contact("+15550000000"));
}
