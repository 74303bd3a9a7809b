//! Unit tests for Wikid

mod database {
    use tempfile::TempDir;
    use wikid::db::Database;
    use wikid::models::NewUser;

    pub fn setup_test_db() -> (TempDir, Database) {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("test.db");
        let db = Database::new(&db_path).unwrap();
        (tmp, db)
    }

    pub fn make_user(db: &Database, username: &str) -> wikid::models::User {
        db.create_user(NewUser {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password: "password123".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_new_user_gets_contributor_tag() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "alice");
        assert_eq!(user.tags, vec!["Contributor".to_string()]);
        assert!(!user.is_admin);
    }

    #[test]
    fn test_duplicate_username() {
        let (_tmp, db) = setup_test_db();

        make_user(&db, "dupe");
        let result = db.create_user(NewUser {
            username: "dupe".to_string(),
            email: Some("other@example.com".to_string()),
            password: "password123".to_string(),
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_get_nonexistent_user() {
        let (_tmp, db) = setup_test_db();

        let user = db.get_user_by_username("nobody").unwrap();
        assert!(user.is_none());
        assert!(db.get_user_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_authenticate_user() {
        let (_tmp, db) = setup_test_db();

        make_user(&db, "bob");

        let user = db.authenticate_user("bob", "password123").unwrap();
        assert!(user.is_some());
        assert!(user.unwrap().last_login.is_some());

        let wrong = db.authenticate_user("bob", "wrongpassword").unwrap();
        assert!(wrong.is_none());

        let missing = db.authenticate_user("nobody", "password123").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_authenticate_by_email() {
        let (_tmp, db) = setup_test_db();

        make_user(&db, "carol");

        let user = db
            .authenticate_user("carol@example.com", "password123")
            .unwrap();
        assert!(user.is_some());
    }

    #[test]
    fn test_set_user_tags_replaces() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "dave");
        db.create_tag("Editors", None).unwrap();

        db.set_user_tags(user.id, &["Editors".to_string()]).unwrap();

        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(user.tags, vec!["Editors".to_string()]);
    }

    #[test]
    fn test_set_user_tags_skips_unknown() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "erin");
        db.set_user_tags(
            user.id,
            &["Contributor".to_string(), "NoSuchTag".to_string()],
        )
        .unwrap();

        let user = db.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(user.tags, vec!["Contributor".to_string()]);
    }

    #[test]
    fn test_delete_user_cascades_tags() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "gone");
        db.delete_user(user.id).unwrap();

        assert!(db.get_user_by_username("gone").unwrap().is_none());
        assert!(db.resolve_permissions(Some(user.id)).unwrap().is_empty());
    }
}

mod permissions {
    use super::database::{make_user, setup_test_db};
    use wikid::models::User;

    #[test]
    fn test_contributor_baseline() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "writer");
        let granted = db.resolve_permissions(Some(user.id)).unwrap();

        assert!(granted.contains(&"view_pages".to_string()));
        assert!(granted.contains(&"create_pages".to_string()));
        assert!(granted.contains(&"edit_pages".to_string()));
        assert!(granted.contains(&"comment".to_string()));
        assert!(!granted.contains(&"manage_users".to_string()));
        assert!(!granted.contains(&"delete_pages".to_string()));
    }

    #[test]
    fn test_guest_permissions() {
        let (_tmp, db) = setup_test_db();

        let granted = db.resolve_permissions(None).unwrap();
        assert_eq!(
            granted,
            vec!["export_pages".to_string(), "view_pages".to_string()]
        );
    }

    #[test]
    fn test_tagless_user_has_no_permissions() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "bare");
        db.set_user_tags(user.id, &[]).unwrap();

        let granted = db.resolve_permissions(Some(user.id)).unwrap();
        assert!(granted.is_empty());
    }

    #[test]
    fn test_union_across_tags_deduplicates() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "multi");
        let tag = db.create_tag("Moderators", None).unwrap();

        let all = db.list_permissions().unwrap();
        let view = all.iter().find(|p| p.name == "view_pages").unwrap().id;
        let moderate = all
            .iter()
            .find(|p| p.name == "moderate_comments")
            .unwrap()
            .id;
        db.set_tag_permissions(tag.id, &[view, moderate]).unwrap();

        db.set_user_tags(
            user.id,
            &["Contributor".to_string(), "Moderators".to_string()],
        )
        .unwrap();

        let granted = db.resolve_permissions(Some(user.id)).unwrap();
        assert!(granted.contains(&"moderate_comments".to_string()));
        assert_eq!(
            granted
                .iter()
                .filter(|name| name.as_str() == "view_pages")
                .count(),
            1
        );
    }

    #[test]
    fn test_grant_takes_effect_immediately() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "promoted");
        assert!(!db
            .resolve_permissions(Some(user.id))
            .unwrap()
            .contains(&"delete_pages".to_string()));

        let contributor = db.get_tag_by_name("Contributor").unwrap().unwrap();
        let mut ids = db.tag_permission_ids(contributor.id).unwrap();
        let delete = db
            .list_permissions()
            .unwrap()
            .into_iter()
            .find(|p| p.name == "delete_pages")
            .unwrap();
        ids.push(delete.id);
        db.set_tag_permissions(contributor.id, &ids).unwrap();

        assert!(db
            .resolve_permissions(Some(user.id))
            .unwrap()
            .contains(&"delete_pages".to_string()));
    }

    #[test]
    fn test_set_tag_permissions_replaces() {
        let (_tmp, db) = setup_test_db();

        let tag = db.create_tag("Narrow", None).unwrap();
        let all = db.list_permissions().unwrap();
        let view = all.iter().find(|p| p.name == "view_pages").unwrap().id;
        let comment = all.iter().find(|p| p.name == "comment").unwrap().id;

        db.set_tag_permissions(tag.id, &[view, comment]).unwrap();
        db.set_tag_permissions(tag.id, &[view]).unwrap();

        assert_eq!(db.tag_permission_ids(tag.id).unwrap(), vec![view]);
    }

    #[test]
    fn test_effective_permissions_admin_universe() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "root");
        db.set_user_admin(user.id, true).unwrap();
        db.set_user_tags(user.id, &[]).unwrap();

        let admin = User {
            is_admin: true,
            ..db.get_user_by_id(user.id).unwrap().unwrap()
        };
        let effective = db.effective_permissions(&admin).unwrap();

        assert_eq!(effective.len(), db.list_permissions().unwrap().len());
        assert!(effective.contains(&"manage_permissions".to_string()));
    }

    #[test]
    fn test_permission_crud() {
        let (_tmp, db) = setup_test_db();

        let created = db
            .create_permission("embed_media", Some("Can embed media"), "pages")
            .unwrap();
        let updated = db
            .update_permission(created.id, None, Some("Can embed images"), None)
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Can embed images"));

        db.delete_permission(created.id).unwrap();
        assert!(db.get_permission_by_id(created.id).unwrap().is_none());
    }

    #[test]
    fn test_by_category_grouping() {
        let (_tmp, db) = setup_test_db();

        let grouped = db.permissions_by_category().unwrap();
        assert!(grouped.contains_key("pages"));
        assert!(grouped.contains_key("comments"));
        assert!(grouped["pages"].iter().any(|p| p.name == "view_pages"));
    }
}

mod tags {
    use super::database::setup_test_db;
    use wikid::db::DomainError;

    #[test]
    fn test_system_tags_seeded() {
        let (_tmp, db) = setup_test_db();

        let tags = db.list_tags().unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"Administrator"));
        assert!(names.contains(&"Contributor"));
        assert!(names.contains(&"Unauthenticated User"));
        assert!(tags.iter().filter(|t| t.is_system).count() >= 3);
    }

    #[test]
    fn test_system_tag_rename_refused() {
        let (_tmp, db) = setup_test_db();

        let tag = db.get_tag_by_name("Contributor").unwrap().unwrap();
        let err = db.update_tag(tag.id, Some("Renamed"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::SystemTagRename)
        ));
    }

    #[test]
    fn test_system_tag_color_change_allowed() {
        let (_tmp, db) = setup_test_db();

        let tag = db.get_tag_by_name("Contributor").unwrap().unwrap();
        let updated = db.update_tag(tag.id, None, Some("#000000")).unwrap();
        assert_eq!(updated.color, "#000000");
    }

    #[test]
    fn test_system_tag_delete_refused() {
        let (_tmp, db) = setup_test_db();

        let tag = db.get_tag_by_name("Unauthenticated User").unwrap().unwrap();
        let err = db.delete_tag(tag.id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::SystemTagDelete)
        ));
        assert!(db.get_tag_by_id(tag.id).unwrap().is_some());
    }

    #[test]
    fn test_custom_tag_lifecycle() {
        let (_tmp, db) = setup_test_db();

        let tag = db.create_tag("Reviewers", Some("#123456")).unwrap();
        assert!(!tag.is_system);
        assert_eq!(tag.color, "#123456");

        let renamed = db.update_tag(tag.id, Some("Proofreaders"), None).unwrap();
        assert_eq!(renamed.name, "Proofreaders");

        db.delete_tag(tag.id).unwrap();
        assert!(db.get_tag_by_id(tag.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_tag_name() {
        let (_tmp, db) = setup_test_db();

        db.create_tag("Unique", None).unwrap();
        assert!(db.create_tag("Unique", None).is_err());
    }
}

mod pages {
    use super::database::{make_user, setup_test_db};

    #[test]
    fn test_create_and_get_page() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "author");
        let page = db
            .create_page("Home", "Welcome to the wiki.", Some("home"), author.id)
            .unwrap();

        assert_eq!(page.title, "Home");
        assert_eq!(page.author_username.as_deref(), Some("author"));
        assert!(page.comments_enabled);
        assert!(!page.is_protected);

        let by_title = db.get_page_by_title("Home").unwrap().unwrap();
        assert_eq!(by_title.id, page.id);
        assert!(db.get_page_by_id(page.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_update_archives_previous_version() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "editor");
        let page = db.create_page("Doc", "version one", None, author.id).unwrap();

        let updated = db
            .update_content(page.id, "version two", None, author.id)
            .unwrap();
        assert_eq!(updated.content, "version two");

        let history = db.history_for_page(page.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by_username.as_deref(), Some("editor"));

        let detail = db.history_detail(page.id, history[0].id).unwrap().unwrap();
        assert_eq!(detail.content, "version one");
        assert_eq!(detail.title, "Doc");
    }

    #[test]
    fn test_k_updates_leave_k_versions_newest_first() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "busy");
        let page = db.create_page("Log", "v0", None, author.id).unwrap();

        for i in 1..=4 {
            db.update_content(page.id, &format!("v{}", i), None, author.id)
                .unwrap();
        }

        let history = db.history_for_page(page.id).unwrap();
        assert_eq!(history.len(), 4);
        // Same-second timestamps fall back to id ordering
        for pair in history.windows(2) {
            assert!(pair[0].id > pair[1].id);
        }

        let newest = db.history_detail(page.id, history[0].id).unwrap().unwrap();
        assert_eq!(newest.content, "v3");
        let oldest = db.history_detail(page.id, history[3].id).unwrap().unwrap();
        assert_eq!(oldest.content, "v0");
    }

    #[test]
    fn test_rename_archives_old_title() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "renamer");
        let page = db.create_page("Old Name", "body", None, author.id).unwrap();

        let renamed = db.rename_page(page.id, "New Name", author.id).unwrap();
        assert_eq!(renamed.title, "New Name");
        assert_eq!(renamed.content, "body");

        let history = db.history_for_page(page.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "Old Name");
    }

    #[test]
    fn test_duplicate_title_rejected() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "titler");
        db.create_page("Taken", "a", None, author.id).unwrap();
        assert!(db.create_page("Taken", "b", None, author.id).is_err());
    }

    #[test]
    fn test_restore_is_a_normal_update() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "restorer");
        let page = db.create_page("Doc", "original", None, author.id).unwrap();
        db.update_content(page.id, "vandalized", None, author.id)
            .unwrap();

        let history = db.history_for_page(page.id).unwrap();
        let archived = db.history_detail(page.id, history[0].id).unwrap().unwrap();

        // Restoring archives the current content too
        let restored = db
            .update_content(page.id, &archived.content, None, author.id)
            .unwrap();
        assert_eq!(restored.content, "original");

        let history = db.history_for_page(page.id).unwrap();
        assert_eq!(history.len(), 2);
        let pre_restore = db.history_detail(page.id, history[0].id).unwrap().unwrap();
        assert_eq!(pre_restore.content, "vandalized");
    }

    #[test]
    fn test_update_missing_page() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "ghost");
        assert!(db.update_content(999, "content", None, author.id).is_err());
        assert!(db.rename_page(999, "Title", author.id).is_err());
    }

    #[test]
    fn test_protection_and_comment_flags() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "flagger");
        let page = db.create_page("Flags", "body", None, author.id).unwrap();

        db.set_page_protected(page.id, true).unwrap();
        db.set_page_comments_enabled(page.id, false).unwrap();

        let page = db.get_page_by_id(page.id).unwrap().unwrap();
        assert!(page.is_protected);
        assert!(!page.comments_enabled);
    }

    #[test]
    fn test_delete_page_cascades_history() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "cleaner");
        let page = db.create_page("Doomed", "v1", None, author.id).unwrap();
        db.update_content(page.id, "v2", None, author.id).unwrap();

        db.delete_page(page.id).unwrap();

        assert!(db.get_page_by_id(page.id).unwrap().is_none());
        assert!(db.history_for_page(page.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_author_keeps_pages_and_history() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "departed");
        let page = db.create_page("Legacy", "v1", None, author.id).unwrap();
        db.update_content(page.id, "v2", None, author.id).unwrap();

        db.delete_user(author.id).unwrap();

        let page = db.get_page_by_id(page.id).unwrap().unwrap();
        assert_eq!(page.content, "v2");
        assert!(page.author_id.is_none());
        assert!(page.author_username.is_none());

        let history = db.history_for_page(page.id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].changed_by.is_none());
        assert!(history[0].changed_by_username.is_none());

        let detail = db.history_detail(page.id, history[0].id).unwrap().unwrap();
        assert_eq!(detail.content, "v1");
    }

    #[test]
    fn test_list_pages_excludes_content() {
        let (_tmp, db) = setup_test_db();

        let author = make_user(&db, "lister");
        db.create_page("Bravo", "b", None, author.id).unwrap();
        db.create_page("Alpha", "a", None, author.id).unwrap();

        let pages = db.list_pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title, "Alpha");
        assert_eq!(pages[1].title, "Bravo");
    }
}

mod comments {
    use super::database::{make_user, setup_test_db};
    use wikid::db::DomainError;

    #[test]
    fn test_create_and_list_comments() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "talker");
        let page = db.create_page("Chat", "body", None, user.id).unwrap();

        let first = db.create_comment(page.id, user.id, "First!", None).unwrap();
        let reply = db
            .create_comment(page.id, user.id, "A reply", Some(first.id))
            .unwrap();

        let comments = db.comments_for_page(page.id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, first.id);
        assert_eq!(reply.parent_id, Some(first.id));
        assert_eq!(comments[1].parent_id, Some(first.id));
        assert_eq!(comments[0].username, "talker");
    }

    #[test]
    fn test_parent_must_exist() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "orphan");
        let page = db.create_page("Page", "body", None, user.id).unwrap();

        let err = db
            .create_comment(page.id, user.id, "reply", Some(999))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ParentCommentMissing)
        ));
    }

    #[test]
    fn test_parent_must_be_on_same_page() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "crosser");
        let page_a = db.create_page("A", "body", None, user.id).unwrap();
        let page_b = db.create_page("B", "body", None, user.id).unwrap();

        let parent = db.create_comment(page_a.id, user.id, "on A", None).unwrap();
        let err = db
            .create_comment(page_b.id, user.id, "on B", Some(parent.id))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ParentCommentOtherPage)
        ));
    }

    #[test]
    fn test_update_comment() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "fixer");
        let page = db.create_page("Page", "body", None, user.id).unwrap();
        let comment = db.create_comment(page.id, user.id, "typo", None).unwrap();

        let updated = db.update_comment(comment.id, "fixed").unwrap();
        assert_eq!(updated.content, "fixed");
    }

    #[test]
    fn test_delete_comment_cascades_replies() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "pruner");
        let page = db.create_page("Page", "body", None, user.id).unwrap();
        let parent = db.create_comment(page.id, user.id, "root", None).unwrap();
        db.create_comment(page.id, user.id, "child", Some(parent.id))
            .unwrap();

        db.delete_comment(parent.id).unwrap();
        assert!(db.comments_for_page(page.id).unwrap().is_empty());
    }
}

mod activities {
    use super::database::{make_user, setup_test_db};
    use serde_json::json;

    #[test]
    fn test_record_and_list() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "actor");
        db.record_activity(
            Some(user.id),
            "page_created",
            "Created \"Home\"",
            None,
            Some("file-plus"),
            Some(&json!({ "page_id": 1 })),
        )
        .unwrap();

        let feed = db.list_activities(50, 0, false).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, "page_created");
        assert_eq!(feed[0].username.as_deref(), Some("actor"));
        assert_eq!(feed[0].metadata["page_id"], 1);
    }

    #[test]
    fn test_guest_feed_only_shows_page_activity() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "mixed");
        db.record_activity(Some(user.id), "user_login", "Logged in", None, None, None)
            .unwrap();
        db.record_activity(Some(user.id), "page_updated", "Edited", None, None, None)
            .unwrap();
        db.record_activity(Some(user.id), "comment_created", "Said", None, None, None)
            .unwrap();

        let full = db.list_activities(50, 0, false).unwrap();
        assert_eq!(full.len(), 3);

        let guest = db.list_activities(50, 0, true).unwrap();
        assert_eq!(guest.len(), 1);
        assert_eq!(guest[0].kind, "page_updated");
    }

    #[test]
    fn test_pagination_newest_first() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "pager");
        for i in 0..5 {
            db.record_activity(
                Some(user.id),
                "page_created",
                &format!("Page {}", i),
                None,
                None,
                None,
            )
            .unwrap();
        }

        let first = db.list_activities(2, 0, false).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "Page 4");

        let second = db.list_activities(2, 2, false).unwrap();
        assert_eq!(second[0].title, "Page 2");
    }

    #[test]
    fn test_deleting_user_keeps_activity() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "leaver");
        db.record_activity(Some(user.id), "page_created", "Made a page", None, None, None)
            .unwrap();
        db.delete_user(user.id).unwrap();

        let feed = db.list_activities(50, 0, false).unwrap();
        assert_eq!(feed.len(), 1);
        assert!(feed[0].user_id.is_none());
        assert!(feed[0].username.is_none());
    }
}

mod sections {
    use wikid::sections::{
        parse_sections, rename_section, reorder_sections, replace_section_content,
        serialize_sections, strip_markers, Section,
    };

    const MARKED: &str = "Intro text.\n\
        <!-- section:usage title=\"Usage\" -->\n\
        How to use it.\n\
        <!-- /section:usage -->\n\
        <!-- section:faq title=\"FAQ\" -->\n\
        Questions.\n\
        <!-- /section:faq -->\n";

    #[test]
    fn test_markerless_content_is_one_main_section() {
        let sections = parse_sections("Just some markdown.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "main-content");
        assert_eq!(sections[0].title, "Main Content");
        assert_eq!(sections[0].content, "Just some markdown.");
    }

    #[test]
    fn test_parse_marked_content() {
        let sections = parse_sections(MARKED);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].id, "main-content");
        assert_eq!(sections[0].content, "Intro text.");
        assert_eq!(sections[1].id, "usage");
        assert_eq!(sections[1].title, "Usage");
        assert_eq!(sections[1].content, "How to use it.");
        assert_eq!(sections[2].id, "faq");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let once = serialize_sections(&parse_sections(MARKED));
        let twice = serialize_sections(&parse_sections(&once));
        assert_eq!(once, twice);
        assert_eq!(once, MARKED);
    }

    #[test]
    fn test_unterminated_section_runs_to_end() {
        let content = "<!-- section:open title=\"Open\" -->\nno end marker here";
        let sections = parse_sections(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "open");
        assert_eq!(sections[0].content, "no end marker here");

        // Serialization adds the missing end marker
        let normalized = serialize_sections(&sections);
        assert!(normalized.contains("<!-- /section:open -->"));
    }

    #[test]
    fn test_loose_text_folds_into_previous_section() {
        let content = "<!-- section:a title=\"A\" -->\nalpha\n<!-- /section:a -->\n\
            stray text\n\
            <!-- section:b title=\"B\" -->\nbeta\n<!-- /section:b -->\n";
        let sections = parse_sections(content);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "alpha\nstray text");
    }

    #[test]
    fn test_malformed_marker_is_plain_text() {
        let content = "<!-- section:bad id no title -->\nbody";
        let sections = parse_sections(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "main-content");
        assert!(sections[0].content.contains("<!-- section:bad"));
    }

    #[test]
    fn test_rename_section_only_touches_title() {
        let renamed = rename_section(MARKED, "usage", "Getting Started").unwrap();
        let sections = parse_sections(&renamed);
        assert_eq!(sections[1].title, "Getting Started");
        assert_eq!(sections[1].content, "How to use it.");
        assert_eq!(sections[2].title, "FAQ");

        assert!(rename_section(MARKED, "missing", "X").is_none());
    }

    #[test]
    fn test_replace_section_content() {
        let replaced = replace_section_content(MARKED, "faq", "New answers.").unwrap();
        let sections = parse_sections(&replaced);
        assert_eq!(sections[2].content, "New answers.");
        assert_eq!(sections[1].content, "How to use it.");

        assert!(replace_section_content(MARKED, "missing", "x").is_none());
    }

    #[test]
    fn test_reorder_sections() {
        let order = vec![
            "faq".to_string(),
            "main-content".to_string(),
            "usage".to_string(),
        ];
        let reordered = reorder_sections(MARKED, &order).unwrap();
        let sections = parse_sections(&reordered);
        assert_eq!(sections[0].id, "faq");
        assert_eq!(sections[1].id, "main-content");
        assert_eq!(sections[2].id, "usage");
        // Main section moved off the front gets explicit markers
        assert!(reordered.contains("<!-- section:main-content"));
    }

    #[test]
    fn test_reorder_rejects_bad_order() {
        assert!(reorder_sections(MARKED, &["usage".to_string()]).is_err());
        assert!(reorder_sections(
            MARKED,
            &[
                "usage".to_string(),
                "faq".to_string(),
                "nope".to_string()
            ]
        )
        .is_err());
    }

    #[test]
    fn test_serialize_main_bare_only_when_first() {
        let sections = vec![
            Section::new("main-content", "Main Content", "intro"),
            Section::new("extra", "Extra", "more"),
        ];
        let out = serialize_sections(&sections);
        assert!(out.starts_with("intro\n"));
        assert!(out.contains("<!-- section:extra"));
    }

    #[test]
    fn test_rename_title_with_quotes_keeps_structure() {
        let renamed = rename_section(MARKED, "usage", "Say \"Hi\"").unwrap();
        let sections = parse_sections(&renamed);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[1].title, "Say \"Hi\"");
        assert_eq!(sections[1].content, "How to use it.");
        assert_eq!(sections[2].id, "faq");
        assert_eq!(sections[2].content, "Questions.");

        let twice = serialize_sections(&parse_sections(&renamed));
        assert_eq!(renamed, twice);
    }

    #[test]
    fn test_title_with_ampersand_and_entity_round_trips() {
        let sections = vec![Section::new("mix", "Q&A \"&quot;\" corner", "body")];
        let reparsed = parse_sections(&serialize_sections(&sections));
        assert_eq!(reparsed, sections);
    }

    #[test]
    fn test_round_trip_preserves_trailing_newline() {
        let sections = vec![
            Section::new("main-content", "Main Content", "intro"),
            Section::new("log", "Log", "line one\nline two\n"),
        ];
        let reparsed = parse_sections(&serialize_sections(&sections));
        assert_eq!(reparsed, sections);
    }

    #[test]
    fn test_round_trip_preserves_empty_section() {
        let sections = vec![Section::new("todo", "Todo", "")];
        let reparsed = parse_sections(&serialize_sections(&sections));
        assert_eq!(reparsed, sections);
    }

    #[test]
    fn test_blank_main_dropped_on_both_sides() {
        let sections = vec![
            Section::new("main-content", "Main Content", ""),
            Section::new("extra", "Extra", "body"),
        ];
        let out = serialize_sections(&sections);
        assert!(out.starts_with("<!-- section:extra"));

        let reparsed = parse_sections(&out);
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].id, "extra");
        assert_eq!(reparsed[0].content, "body");
    }

    #[test]
    fn test_strip_markers_produces_headings() {
        let stripped = strip_markers(MARKED);
        assert!(stripped.contains("Intro text."));
        assert!(stripped.contains("## Usage"));
        assert!(stripped.contains("## FAQ"));
        assert!(!stripped.contains("<!-- section:"));
    }
}

mod auth {
    use super::database::{make_user, setup_test_db};
    use wikid::auth::{authorize, authorize_protected, issue_token, perm, verify_token, AuthUser};
    use wikid::Config;

    fn test_config() -> Config {
        Config {
            jwt_secret: "unit-test-secret".to_string(),
            ..Config::default()
        }
    }

    fn actor_for(user: &wikid::models::User) -> AuthUser {
        AuthUser {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let (_tmp, db) = setup_test_db();
        let config = test_config();

        let user = make_user(&db, "tokenuser");
        let token = issue_token(&config, &user).unwrap();

        let decoded = verify_token(&config, &token).unwrap();
        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.username, "tokenuser");
        assert!(!decoded.is_admin);
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let (_tmp, db) = setup_test_db();
        let config = test_config();

        let user = make_user(&db, "forger");
        let token = issue_token(&config, &user).unwrap();

        let other = Config {
            jwt_secret: "different-secret".to_string(),
            ..Config::default()
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_authorize_contributor() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "member");
        let actor = actor_for(&user);

        assert!(authorize(&db, Some(&actor), perm::EDIT_PAGES).is_ok());
        assert!(authorize(&db, Some(&actor), perm::MANAGE_USERS).is_err());
    }

    #[test]
    fn test_authorize_admin_bypasses_tags() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "boss");
        db.set_user_admin(user.id, true).unwrap();
        db.set_user_tags(user.id, &[]).unwrap();

        let actor = AuthUser {
            is_admin: true,
            ..actor_for(&user)
        };
        assert!(authorize(&db, Some(&actor), perm::MANAGE_PERMISSIONS).is_ok());
        assert!(authorize_protected(&db, Some(&actor)).is_ok());
    }

    #[test]
    fn test_authorize_guest() {
        let (_tmp, db) = setup_test_db();

        assert!(authorize(&db, None, perm::VIEW_PAGES).is_ok());
        assert!(authorize(&db, None, perm::EXPORT_PAGES).is_ok());
        assert!(authorize(&db, None, perm::EDIT_PAGES).is_err());
    }

    #[test]
    fn test_protected_gate_requires_protect_permission() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "plain");
        let actor = actor_for(&user);
        let err = authorize_protected(&db, Some(&actor)).unwrap_err();
        assert!(err.to_string().contains("protected"));

        let contributor = db.get_tag_by_name("Contributor").unwrap().unwrap();
        let mut ids = db.tag_permission_ids(contributor.id).unwrap();
        let protect = db
            .list_permissions()
            .unwrap()
            .into_iter()
            .find(|p| p.name == "protect_pages")
            .unwrap();
        ids.push(protect.id);
        db.set_tag_permissions(contributor.id, &ids).unwrap();

        assert!(authorize_protected(&db, Some(&actor)).is_ok());
    }
}

mod export {
    use super::database::{make_user, setup_test_db};
    use wikid::export::{export_html, export_markdown, render_html, safe_filename};

    #[test]
    fn test_markdown_export_has_banner() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "exporter");
        let page = db
            .create_page("Guide", "# Heading\n\nBody text.", None, user.id)
            .unwrap();

        let md = export_markdown(&page);
        assert!(md.starts_with("# Heading"));
        assert!(md.contains("Exported from the wiki"));
        assert!(md.contains("Guide"));
    }

    #[test]
    fn test_html_export_renders_markdown() {
        let (_tmp, db) = setup_test_db();

        let user = make_user(&db, "webber");
        let content = "Intro.\n\
            <!-- section:detail title=\"Details\" -->\n\
            Some **bold** text.\n\
            <!-- /section:detail -->\n";
        let page = db.create_page("Rendered", content, None, user.id).unwrap();

        let html = export_html(&page);
        assert!(html.contains("<title>Rendered</title>"));
        assert!(html.contains("<h2>Details</h2>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(!html.contains("<!-- section:"));
    }

    #[test]
    fn test_render_html_tables() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("Getting Started"), "Getting_Started");
        assert_eq!(safe_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(safe_filename("  "), "page");
        assert_eq!(safe_filename("caf\u{e9}"), "caf\u{e9}");
    }
}
