pub mod account;
pub mod character;
pub mod db;
pub mod error;
pub mod gateway;
mod schema;

pub use account::{Account, AccountRecord, AccountRepo};
pub use character::{CharacterRepo, PlayerCharacter, Sex};
pub use db::PlayerDb;
pub use error::PlayerDbError;
pub use gateway::{AccountGateway, SqliteGateway};

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(name: &str) -> PlayerCharacter {
        PlayerCharacter::new(name, "Human", Sex::Male, "Warrior", "brave")
    }

    #[test]
    fn open_memory_db() {
        let db = PlayerDb::open_memory().unwrap();
        assert!(db.account().get_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn create_account() {
        let db = PlayerDb::open_memory().unwrap();
        let account = db.account().create("TestUser", "password123").unwrap();
        assert_eq!(account.username, "TestUser");
    }

    #[test]
    fn duplicate_account_rejected() {
        let db = PlayerDb::open_memory().unwrap();
        db.account().create("User1", "pass1").unwrap();
        let result = db.account().create("User1", "pass2");
        assert!(matches!(result, Err(PlayerDbError::AccountExists(_))));
    }

    #[test]
    fn case_insensitive_username() {
        let db = PlayerDb::open_memory().unwrap();
        db.account().create("Alice", "pass").unwrap();
        let result = db.account().create("alice", "pass2");
        assert!(matches!(result, Err(PlayerDbError::AccountExists(_))));
    }

    #[test]
    fn authenticate_success() {
        let db = PlayerDb::open_memory().unwrap();
        db.account().create("Hero", "secret123").unwrap();
        let account = db.account().authenticate("hero", "secret123").unwrap();
        assert_eq!(account.username, "Hero");
    }

    #[test]
    fn authenticate_wrong_password() {
        let db = PlayerDb::open_memory().unwrap();
        db.account().create("Hero", "secret123").unwrap();
        let result = db.account().authenticate("Hero", "wrongpass");
        assert!(matches!(result, Err(PlayerDbError::InvalidPassword)));
    }

    #[test]
    fn authenticate_nonexistent_account() {
        let db = PlayerDb::open_memory().unwrap();
        let result = db.account().authenticate("Ghost", "pass");
        assert!(matches!(result, Err(PlayerDbError::AccountNotFound(_))));
    }

    #[test]
    fn save_and_load_account_characters() {
        let db = PlayerDb::open_memory().unwrap();
        let record = db.account().create("Multi", "pass").unwrap();
        let mut account = Account::new(record.id, record.username);
        account.add_character(hero("Zed"));
        account.add_character(hero("Aria"));
        db.save_account(&account).unwrap();

        let loaded = db.load_account("multi").unwrap();
        let names: Vec<_> = loaded.characters().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Aria", "Zed"]);
    }

    #[test]
    fn save_updates_existing_character() {
        let db = PlayerDb::open_memory().unwrap();
        let record = db.account().create("Saver", "pass").unwrap();
        let mut account = Account::new(record.id, record.username);
        account.add_character(hero("Aria"));
        db.save_account(&account).unwrap();

        let pc = account.character_mut("Aria").unwrap();
        pc.level = 5;
        pc.last_room = Some("Hallway".into());
        db.save_account(&account).unwrap();

        let loaded = db.load_account("Saver").unwrap();
        let pc = loaded.character("aria").unwrap();
        assert_eq!(pc.level, 5);
        assert_eq!(pc.last_room.as_deref(), Some("Hallway"));
    }

    #[test]
    fn character_name_unique_across_accounts() {
        let db = PlayerDb::open_memory().unwrap();
        let a1 = db.account().create("P1", "p").unwrap();
        let a2 = db.account().create("P2", "p").unwrap();
        db.character().upsert(a1.id, &hero("Hero")).unwrap();

        let result = db.character().upsert(a2.id, &hero("HERO"));
        assert!(matches!(result, Err(PlayerDbError::CharacterNameTaken(_))));
        assert!(db.character().name_taken("hero").unwrap());
        assert!(!db.character().name_taken("Nobody").unwrap());
    }

    #[test]
    fn failed_save_rolls_back() {
        let db = PlayerDb::open_memory().unwrap();
        let a1 = db.account().create("P1", "p").unwrap();
        let a2 = db.account().create("P2", "p").unwrap();
        db.character().upsert(a1.id, &hero("Taken")).unwrap();

        let mut account = Account::new(a2.id, "P2");
        account.add_character(hero("Fresh"));
        account.add_character(hero("Taken"));
        assert!(db.save_account(&account).is_err());
        assert!(!db.character().name_taken("Fresh").unwrap());
    }

    #[test]
    fn gateway_flow() {
        let gateway = SqliteGateway::open_memory().unwrap();
        let mut account = gateway.create("bob", "secret").unwrap();
        assert!(matches!(
            gateway.create("BOB", "secret2"),
            Err(PlayerDbError::AccountExists(_))
        ));

        account.add_character(hero("Aria"));
        gateway.save(&account).unwrap();
        assert!(gateway.character_name_taken("aria").unwrap());

        let logged_in = gateway.log_in("bob", "secret").unwrap();
        assert!(logged_in.character("Aria").is_some());
        assert!(gateway.log_in("bob", "secret2").is_err());
        assert_eq!(gateway.load("Bob").unwrap().id, account.id);
    }

    #[test]
    fn open_file_db_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("accounts.db");
        let path = path.to_str().unwrap();
        {
            let gateway = SqliteGateway::open(path).unwrap();
            gateway.create("keeper", "pw").unwrap();
        }
        let gateway = SqliteGateway::open(path).unwrap();
        assert!(gateway.log_in("keeper", "pw").is_ok());
    }
}
