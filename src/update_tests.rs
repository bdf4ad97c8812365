//! Tests for update types and prefix matching.

use super::*;

fn net(s: &str) -> IpNet {
    s.parse().unwrap()
}

mod prefix_matching {
    use super::*;

    #[test]
    fn identical_prefixes_match() {
        assert!(same_prefix(&net("10.0.0.5/32"), &net("10.0.0.5/32")));
        assert!(same_prefix(&net("fe80::1/64"), &net("fe80::1/64")));
    }

    #[test]
    fn different_prefix_length_does_not_match() {
        assert!(!same_prefix(&net("10.0.0.5/32"), &net("10.0.0.5/24")));
    }

    #[test]
    fn different_host_bits_do_not_match() {
        assert!(!same_prefix(&net("10.0.0.5/24"), &net("10.0.0.6/24")));
    }

    #[test]
    fn v4_and_v6_never_match() {
        // Same prefix length, and the v6 address embeds the v4 bits.
        assert!(!same_prefix(&net("10.0.0.5/24"), &net("::ffff:10.0.0.5/24")));
        assert!(!same_prefix(&net("0.0.0.0/0"), &net("::/0")));
    }

    #[test]
    fn attributes_do_not_affect_matching() {
        let a = AddrUpdate::removed(3, net("10.0.0.5/32")).with_flags(0x80);
        let b = AddrUpdate::added(3, net("10.0.0.5/32"))
            .with_scope(253)
            .with_lifetimes(Some(Duration::from_secs(60)), None);

        assert!(a.same_prefix_as(&b));
    }
}

mod constructors {
    use super::*;

    #[test]
    fn added_and_removed_set_direction() {
        assert!(AddrUpdate::added(1, net("192.168.1.10/24")).is_add);
        assert!(!AddrUpdate::removed(1, net("192.168.1.10/24")).is_add);
    }

    #[test]
    fn new_addr_update_has_default_attributes() {
        let update = AddrUpdate::added(7, net("2001:db8::1/64"));

        assert_eq!(update.index, 7);
        assert_eq!(update.flags, 0);
        assert_eq!(update.scope, 0);
        assert_eq!(update.preferred_lifetime, None);
        assert_eq!(update.valid_lifetime, None);
    }

    #[test]
    fn link_state_builder() {
        let state = LinkState::new("eth0", OperState::Up).with_flags(0x1003);

        assert_eq!(state.name, "eth0");
        assert_eq!(state.oper_state, OperState::Up);
        assert_eq!(state.flags, 0x1003);
    }
}

mod update_enum {
    use super::*;

    #[test]
    fn index_covers_both_variants() {
        let link = Update::from(LinkUpdate::new(2, LinkState::new("eth1", OperState::Down)));
        let addr = Update::from(AddrUpdate::added(5, net("10.1.0.1/16")));

        assert_eq!(link.index(), 2);
        assert_eq!(addr.index(), 5);
    }

    #[test]
    fn kind_distinguishes_add_and_remove() {
        let link = Update::from(LinkUpdate::new(1, LinkState::default()));
        let added = Update::from(AddrUpdate::added(1, net("10.0.0.1/32")));
        let removed = Update::from(AddrUpdate::removed(1, net("10.0.0.1/32")));

        assert_eq!(link.kind(), UpdateKind::Link);
        assert_eq!(added.kind(), UpdateKind::AddrAdded);
        assert_eq!(removed.kind(), UpdateKind::AddrRemoved);
    }

    #[test]
    fn accessors_return_matching_variant_only() {
        let addr = Update::from(AddrUpdate::added(1, net("10.0.0.1/32")));

        assert!(addr.as_addr().is_some());
        assert!(addr.as_link().is_none());
    }

    #[test]
    fn display_is_compact() {
        let removed = Update::from(AddrUpdate::removed(3, net("10.0.0.5/32")));
        let link = Update::from(LinkUpdate::new(3, LinkState::new("eth0", OperState::Up)));

        assert_eq!(removed.to_string(), "addr del if=3 10.0.0.5/32");
        assert_eq!(link.to_string(), "link if=3 name=eth0 state=up");
    }
}
