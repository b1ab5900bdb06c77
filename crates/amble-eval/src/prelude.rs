//! Library functions written in Amble itself, evaluated once per context
//! before the first user program.

pub const PRELUDE: &str = r#"
function is_list(xs) {
    return is_null(xs) || (is_pair(xs) && is_list(tail(xs)));
}

function length(xs) {
    return is_null(xs) ? 0 : 1 + length(tail(xs));
}

function map(f, xs) {
    return is_null(xs) ? null : pair(f(head(xs)), map(f, tail(xs)));
}

function filter(pred, xs) {
    return is_null(xs)
        ? null
        : pred(head(xs))
        ? pair(head(xs), filter(pred, tail(xs)))
        : filter(pred, tail(xs));
}

function accumulate(f, initial, xs) {
    return is_null(xs) ? initial : f(head(xs), accumulate(f, initial, tail(xs)));
}

function append(xs, ys) {
    return is_null(xs) ? ys : pair(head(xs), append(tail(xs), ys));
}

function reverse(xs) {
    function rev(rest, reversed) {
        return is_null(rest)
            ? reversed
            : rev(tail(rest), pair(head(rest), reversed));
    }
    return rev(xs, null);
}

function member(v, xs) {
    return is_null(xs) ? null : v === head(xs) ? xs : member(v, tail(xs));
}

function remove(v, xs) {
    return is_null(xs)
        ? null
        : v === head(xs)
        ? tail(xs)
        : pair(head(xs), remove(v, tail(xs)));
}

function list_ref(xs, n) {
    return n === 0 ? head(xs) : list_ref(tail(xs), n - 1);
}

function enum_list(start, end) {
    return start > end ? null : pair(start, enum_list(start + 1, end));
}

function build_list(fun, n) {
    function build(i) {
        return i >= n ? null : pair(fun(i), build(i + 1));
    }
    return build(0);
}

function for_each(f, xs) {
    if (is_null(xs)) {
        return true;
    } else {
        f(head(xs));
        return for_each(f, tail(xs));
    }
}

/* Whether the items of a list are pairwise distinct (SICP JS 4.3.2). */
function distinct(items) {
    return is_null(items)
        ? true
        : is_null(tail(items))
        ? true
        : is_null(member(head(items), tail(items)))
        ? distinct(tail(items))
        : false;
}

function an_element_of(items) {
    require(!is_null(items));
    return amb(head(items), an_element_of(tail(items)));
}

function an_integer_starting_from(n) {
    return amb(n, an_integer_starting_from(n + 1));
}

function int_between(low, high) {
    require(low <= high);
    return amb(low, int_between(low + 1, high));
}
"#;
