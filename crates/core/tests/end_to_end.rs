use quadrosol_core::abi::{decode_int, write_int, write_point, Cursor};
use quadrosol_core::{dispatch, Config, MemoryHost, Opcode};
use quadrosol_types::{Hash, Keccak256Hasher, Point, Rect};

fn call(host: &MemoryHost, config: &Config, opcode: Opcode, body: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut payload = Vec::new();

    write_int(&mut payload, opcode as i128);
    body(&mut payload);

    dispatch::<MemoryHost, Keccak256Hasher>(host, config, &payload).unwrap()
}

fn decode_single_int(bytes: &[u8]) -> i128 {
    decode_int(bytes).unwrap()
}

fn decode_point_list(bytes: &[u8]) -> Vec<Point> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_int().unwrap();
    let mut out = Vec::new();

    for _ in 0..count {
        out.push(cursor.read_point().unwrap());
    }

    out
}

/// Decodes a `Read` response: root hash, point count, rect.
fn decode_metadata(bytes: &[u8]) -> (Hash, i128, Rect) {
    let hash: Hash = bytes[0..32].try_into().unwrap();
    let mut cursor = Cursor::new(&bytes[32..]);
    let size = cursor.read_int().unwrap();
    let rect = cursor.read_rect().unwrap();

    (hash, size, rect)
}

fn whole_domain(host: &MemoryHost, config: &Config, id: i128, rect: Rect) -> Vec<Point> {
    decode_point_list(&call(host, config, Opcode::SearchRect, |p| {
        write_int(p, id);
        write_point(p, rect.min);
        write_point(p, rect.max);
    }))
}

#[test]
fn e1_create_add_has_read() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(-1000, -1000, 2000, 2000);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    let (_, size, read_rect) = decode_metadata(&call(&host, &config, Opcode::Read, |p| {
        write_int(p, id);
    }));

    assert_eq!(size, 0);
    assert_eq!(read_rect, rect);

    let point = Point::new(10, -10);

    let inserted = decode_single_int(&call(&host, &config, Opcode::Add, |p| {
        write_int(p, id);
        write_point(p, point);
    }));

    assert_eq!(inserted, 1);

    let found = decode_single_int(&call(&host, &config, Opcode::Has, |p| {
        write_int(p, id);
        write_point(p, point);
    }));

    assert_eq!(found, 1);

    let (_, size, _) = decode_metadata(&call(&host, &config, Opcode::Read, |p| {
        write_int(p, id);
    }));

    assert_eq!(size, 1);
}

#[test]
fn e1b_adding_the_same_point_twice_is_not_an_error_but_reports_no_change() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 100, 100);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    let point = Point::new(5, 5);

    for expected in [1i128, 0] {
        let inserted = decode_single_int(&call(&host, &config, Opcode::Add, |p| {
            write_int(p, id);
            write_point(p, point);
        }));

        assert_eq!(inserted, expected);
    }

    let (_, size, _) = decode_metadata(&call(&host, &config, Opcode::Read, |p| {
        write_int(p, id);
    }));

    assert_eq!(size, 1);
}

#[test]
fn e1c_adding_a_point_outside_the_rect_reports_no_change() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 10, 10);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    let inserted = decode_single_int(&call(&host, &config, Opcode::Add, |p| {
        write_int(p, id);
        write_point(p, Point::new(100, 100));
    }));

    assert_eq!(inserted, 0);
}

#[test]
fn e2_remove_then_has_is_false() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 100, 100);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    let point = Point::new(5, 5);

    call(&host, &config, Opcode::Add, |p| {
        write_int(p, id);
        write_point(p, point);
    });

    let removed = decode_single_int(&call(&host, &config, Opcode::Remove, |p| {
        write_int(p, id);
        write_point(p, point);
    }));

    assert_eq!(removed, 1);

    let found = decode_single_int(&call(&host, &config, Opcode::Has, |p| {
        write_int(p, id);
        write_point(p, point);
    }));

    assert_eq!(found, 0);

    let removed_again = decode_single_int(&call(&host, &config, Opcode::Remove, |p| {
        write_int(p, id);
        write_point(p, point);
    }));

    assert_eq!(removed_again, 0);
}

#[test]
fn e3_duplicate_shares_points_but_mutations_diverge() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 100, 100);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    call(&host, &config, Opcode::Add, |p| {
        write_int(p, id);
        write_point(p, Point::new(1, 1));
    });

    let dup_id = decode_single_int(&call(&host, &config, Opcode::Duplicate, |p| {
        write_int(p, id);
    }));

    call(&host, &config, Opcode::Add, |p| {
        write_int(p, dup_id);
        write_point(p, Point::new(2, 2));
    });

    let original_points = whole_domain(&host, &config, id, rect);
    let dup_points = whole_domain(&host, &config, dup_id, rect);

    assert_eq!(original_points, vec![Point::new(1, 1)]);
    assert_eq!(dup_points.len(), 2);
}

#[test]
fn e4_delete_then_operations_on_the_handle_error() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 100, 100);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    call(&host, &config, Opcode::Delete, |p| {
        write_int(p, id);
    });

    let mut payload = Vec::new();

    write_int(&mut payload, Opcode::Has as i128);
    write_int(&mut payload, id);
    write_point(&mut payload, Point::new(0, 0));

    let err = dispatch::<MemoryHost, Keccak256Hasher>(&host, &config, &payload).unwrap_err();

    assert!(matches!(err, quadrosol_core::DispatchError::StoreMissing(_)));

    let (hash, size, read_rect) = decode_metadata(&call(&host, &config, Opcode::Read, |p| {
        write_int(p, id);
    }));

    assert_eq!(hash, quadrosol_types::ZERO_HASH);
    assert_eq!(size, 0);
    assert_eq!(read_rect, Rect::default());
}

#[test]
fn e5_search_rect_and_search_circle_and_k_nearest() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(-100, -100, 200, 200);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    for point in [
        Point::new(1, 1),
        Point::new(-1, -1),
        Point::new(50, 50),
        Point::new(2, 2),
    ] {
        call(&host, &config, Opcode::Add, |p| {
            write_int(p, id);
            write_point(p, point);
        });
    }

    let in_rect = decode_point_list(&call(&host, &config, Opcode::SearchRect, |p| {
        write_int(p, id);
        write_point(p, Point::new(0, 0));
        write_point(p, Point::new(10, 10));
    }));

    assert!(in_rect.contains(&Point::new(1, 1)));
    assert!(!in_rect.contains(&Point::new(50, 50)));

    let in_circle = decode_point_list(&call(&host, &config, Opcode::SearchCircle, |p| {
        write_int(p, id);
        write_point(p, Point::new(0, 0));
        write_int(p, 3);
    }));

    assert!(in_circle.contains(&Point::new(1, 1)));
    assert!(!in_circle.contains(&Point::new(50, 50)));

    let nearest = decode_point_list(&call(&host, &config, Opcode::KNearest, |p| {
        write_int(p, id);
        write_point(p, Point::new(0, 0));
        write_int(p, 1);
    }));

    assert_eq!(nearest.len(), 1);
}

#[test]
fn e6_replace_moves_a_point_in_one_mutation() {
    let host = MemoryHost::default();
    let config = Config::default();
    let rect = Rect::new(0, 0, 100, 100);

    let id = decode_single_int(&call(&host, &config, Opcode::Create, |p| {
        write_point(p, rect.min);
        write_point(p, rect.max);
    }));

    call(&host, &config, Opcode::Add, |p| {
        write_int(p, id);
        write_point(p, Point::new(10, 10));
    });

    let mut payload = Vec::new();

    write_int(&mut payload, Opcode::Replace as i128);
    write_int(&mut payload, id);
    write_point(&mut payload, Point::new(10, 10));
    write_point(&mut payload, Point::new(20, 20));

    let response = dispatch::<MemoryHost, Keccak256Hasher>(&host, &config, &payload).unwrap();
    let mut cursor = Cursor::new(&response);
    let removed = cursor.read_int().unwrap();
    let inserted = cursor.read_int().unwrap();

    assert_eq!(removed, 1);
    assert_eq!(inserted, 1);

    let points = whole_domain(&host, &config, id, rect);

    assert_eq!(points, vec![Point::new(20, 20)]);
}
