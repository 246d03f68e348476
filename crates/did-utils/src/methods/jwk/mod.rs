pub(super) mod method;
